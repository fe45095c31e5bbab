//! URL manipulation utilities.
//!
//! Search URL construction, page-number query parameters and resolution of
//! relative links found in listings.

use anyhow::{Context, Result};
use url::Url;

use crate::config::{SiteProfile, SortBy};

/// Build the first-page search URL from keyword, location and sort order.
///
/// Parameters are appended in a fixed order: keyword, location (when
/// non-empty), page number `1`, sort code.
pub fn build_search_url(
    profile: &SiteProfile,
    query: &str,
    location: Option<&str>,
    sort_by: SortBy,
) -> Result<String> {
    let mut url = Url::parse(&profile.search_base_url)
        .with_context(|| format!("Invalid search base URL: {}", profile.search_base_url))?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair(&profile.keyword_param, query.trim());
        if let Some(location) = location.map(str::trim).filter(|l| !l.is_empty()) {
            pairs.append_pair(&profile.location_param, location);
        }
        pairs.append_pair(&profile.page_param, "1");
        let code = match sort_by {
            SortBy::Date => &profile.sort_code_date,
            SortBy::Relevance => &profile.sort_code_relevance,
        };
        if !code.is_empty() {
            pairs.append_pair(&profile.sort_param, code);
        }
    }

    Ok(url.into())
}

/// Read the page-number query parameter, if the URL carries one.
#[must_use]
pub fn page_number(url: &str, param: &str) -> Option<u32> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == param)
        .and_then(|(_, v)| v.parse().ok())
}

/// Return `url` with its page-number parameter set to `page`.
///
/// Other query parameters keep their order; the page parameter is appended
/// when absent.
pub fn with_page_number(url: &str, param: &str, page: u32) -> Result<String> {
    let mut parsed = Url::parse(url).with_context(|| format!("Invalid page URL: {url}"))?;
    let mut replaced = false;
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            if k == param {
                replaced = true;
                (k.into_owned(), page.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    {
        let mut writer = parsed.query_pairs_mut();
        writer.clear();
        for (k, v) in &pairs {
            writer.append_pair(k, v);
        }
        if !replaced {
            writer.append_pair(param, &page.to_string());
        }
    }

    Ok(parsed.into())
}

/// Resolve `href` against `base`, keeping only http(s) results.
#[must_use]
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = match Url::parse(href) {
        Ok(abs) => abs,
        Err(_) => Url::parse(base).ok()?.join(href).ok()?,
    };
    if matches!(resolved.scheme(), "http" | "https") {
        Some(resolved.into())
    } else {
        None
    }
}

/// Check if a URL is valid
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> SiteProfile {
        SiteProfile {
            search_base_url: "https://jobs.test/search".to_string(),
            ..SiteProfile::default()
        }
    }

    #[test]
    fn search_url_carries_all_parameters() {
        let url = build_search_url(&profile(), "rust developer", Some("Berlin"), SortBy::Date)
            .expect("url");
        assert_eq!(
            url,
            "https://jobs.test/search?q=rust+developer&l=Berlin&page=1&sort=date"
        );
    }

    #[test]
    fn search_url_skips_empty_location() {
        let url = build_search_url(&profile(), "qa", Some("  "), SortBy::Relevance).expect("url");
        assert_eq!(url, "https://jobs.test/search?q=qa&page=1&sort=relevance");
    }

    #[test]
    fn page_number_round_trip() {
        let next = with_page_number("https://jobs.test/s?q=a&page=1&sort=date", "page", 2)
            .expect("url");
        assert_eq!(next, "https://jobs.test/s?q=a&page=2&sort=date");
        assert_eq!(page_number(&next, "page"), Some(2));
    }

    #[test]
    fn page_number_appended_when_missing() {
        let next = with_page_number("https://jobs.test/s?q=a", "page", 3).expect("url");
        assert_eq!(next, "https://jobs.test/s?q=a&page=3");
        assert_eq!(page_number("https://jobs.test/s?q=a", "page"), None);
    }

    #[test]
    fn absolutize_relative_and_rejects_other_schemes() {
        assert_eq!(
            absolutize("https://jobs.test/search?q=a", "/job/42"),
            Some("https://jobs.test/job/42".to_string())
        );
        assert_eq!(absolutize("https://jobs.test/", "javascript:void(0)"), None);
        assert_eq!(absolutize("https://jobs.test/", "#top"), None);
    }
}
