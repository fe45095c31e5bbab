//! Listing-card markup extractor
//!
//! The first card selector that matches anything is used for every card on the
//! page. When no card selector matches, anchors whose path looks like a job
//! detail page are harvested as title+URL candidates.

use regex::Regex;
use scraper::{ElementRef, Selector};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::chain::{ParsedPage, StrategyExtractor};
use super::lookup::{compile_selectors, first_element, first_href, first_text};
use super::schema::{ExtractionMethod, RawJobCandidate};
use crate::config::SiteProfile;
use crate::utils::{absolutize, non_empty};

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

pub struct DomExtractor {
    cards: Vec<Selector>,
    title: Vec<Selector>,
    company: Vec<Selector>,
    location: Vec<Selector>,
    salary: Vec<Selector>,
    snippet: Vec<Selector>,
    posted_date: Vec<Selector>,
    link: Vec<Selector>,
    detail_paths: Vec<Regex>,
}

impl DomExtractor {
    #[must_use]
    pub fn new(profile: &SiteProfile) -> Self {
        let detail_paths = profile
            .detail_path_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Skipping invalid detail path pattern '{pattern}': {e}");
                    None
                }
            })
            .collect();

        Self {
            cards: compile_selectors(&profile.card_selectors),
            title: compile_selectors(&profile.title_selectors),
            company: compile_selectors(&profile.company_selectors),
            location: compile_selectors(&profile.location_selectors),
            salary: compile_selectors(&profile.salary_selectors),
            snippet: compile_selectors(&profile.snippet_selectors),
            posted_date: compile_selectors(&profile.posted_date_selectors),
            link: compile_selectors(&profile.link_selectors),
            detail_paths,
        }
    }

    fn card_payload(&self, card: ElementRef<'_>, base: &str) -> Map<String, Value> {
        let mut payload = Map::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(v) = value {
                payload.insert(key.to_string(), Value::String(v));
            }
        };

        put("title", first_text(card, &self.title));
        put("company", first_text(card, &self.company));
        put("location", first_text(card, &self.location));
        put("salary", first_text(card, &self.salary));
        put("postedDate", first_text(card, &self.posted_date));
        put(
            "descriptionHtml",
            first_element(card, &self.snippet).map(|el| el.inner_html()),
        );

        // The card itself is often the anchor
        let href = first_href(card, &self.link)
            .or_else(|| card.value().attr("href").map(ToString::to_string));
        put("url", href.and_then(|h| absolutize(base, &h)));

        if let Some(id) = card
            .value()
            .attr("data-job-id")
            .or_else(|| card.value().attr("data-jk"))
        {
            put("id", Some(id.to_string()));
        }

        payload
    }

    fn looks_like_detail(&self, url: &str) -> bool {
        let path = url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        self.detail_paths.iter().any(|re| re.is_match(&path))
    }

    fn anchor_fallback(&self, page: &ParsedPage<'_>) -> Vec<RawJobCandidate> {
        let mut seen = HashSet::new();
        page.document
            .select(&ANCHOR_SELECTOR)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?;
                let url = absolutize(page.url, href)?;
                if !self.looks_like_detail(&url) || !seen.insert(url.clone()) {
                    return None;
                }
                let mut payload = Map::new();
                if let Some(title) = non_empty(&anchor.text().collect::<String>()) {
                    payload.insert("title".to_string(), Value::String(title));
                }
                payload.insert("url".to_string(), Value::String(url));
                Some(RawJobCandidate::new(ExtractionMethod::Dom, Value::Object(payload)))
            })
            .collect()
    }
}

impl StrategyExtractor for DomExtractor {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Dom
    }

    fn extract(&self, page: &ParsedPage<'_>) -> Vec<RawJobCandidate> {
        let root = page.document.root_element();
        let cards: Option<Vec<ElementRef<'_>>> = self.cards.iter().find_map(|selector| {
            let matched: Vec<_> = root.select(selector).collect();
            (!matched.is_empty()).then_some(matched)
        });

        let Some(cards) = cards else {
            let harvested = self.anchor_fallback(page);
            debug!(
                "No card selector matched on {}, anchor fallback found {} links",
                page.url,
                harvested.len()
            );
            return harvested;
        };

        cards
            .into_iter()
            .map(|card| self.card_payload(card, page.url))
            .filter(|payload| !payload.is_empty())
            .map(|payload| RawJobCandidate::new(ExtractionMethod::Dom, Value::Object(payload)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(html: &str) -> Vec<RawJobCandidate> {
        let extractor = DomExtractor::new(&SiteProfile::default());
        let page = ParsedPage::new("https://jobs.test/search?q=rust", html, &[]);
        extractor.extract(&page)
    }

    #[test]
    fn extracts_fields_from_cards() {
        let html = r#"
            <ul>
              <li class="job-result">
                <h2 class="job-title"><a href="/job/101">Rust Engineer</a></h2>
                <span class="company-name">Acme</span>
                <span class="location">Berlin</span>
                <span class="salary">€70k</span>
                <div class="job-snippet"><p>Build <b>things</b></p></div>
                <time>2 days ago</time>
              </li>
              <li class="job-result">
                <h2 class="job-title"><a href="https://jobs.test/job/102">Go Engineer</a></h2>
              </li>
            </ul>"#;
        let found = run(html);
        assert_eq!(found.len(), 2);
        let first = &found[0].payload;
        assert_eq!(first["title"], json!("Rust Engineer"));
        assert_eq!(first["company"], json!("Acme"));
        assert_eq!(first["url"], json!("https://jobs.test/job/101"));
        assert_eq!(first["postedDate"], json!("2 days ago"));
        assert!(first["descriptionHtml"].as_str().unwrap_or_default().contains("<b>things</b>"));
    }

    #[test]
    fn first_matching_card_selector_is_used_for_the_page() {
        let html = r#"
            <div data-job-id="1"><h3><a href="/job/1">Listed via data attribute</a></h3></div>
            <div class="job-listing"><h3><a href="/job/2">Other layout</a></h3></div>"#;
        let found = run(html);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].payload["id"], json!("1"));
    }

    #[test]
    fn anchor_fallback_harvests_detail_links() {
        let html = r#"
            <a href="/about">About</a>
            <a href="/job/backend-engineer-123">Backend Engineer</a>
            <a href="/job/backend-engineer-123">Backend Engineer</a>
            <a href="/viewjob?jk=9f">Data Analyst</a>"#;
        let found = run(html);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].payload["url"], json!("https://jobs.test/viewjob?jk=9f"));
    }
}
