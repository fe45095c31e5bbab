//! Strategy chain
//!
//! Extractors run in fixed priority order and the first one that yields any
//! candidate wins; the rest are skipped for that page.

use scraper::Html;

use super::dom::DomExtractor;
use super::hydration::HydrationExtractor;
use super::intercepted::InterceptedExtractor;
use super::json_ld::JsonLdExtractor;
use super::schema::{ExtractionMethod, InterceptedResponse, PageSource, RawJobCandidate};
use crate::config::SiteProfile;

/// A page parsed once and shared by every strategy
pub struct ParsedPage<'a> {
    pub url: &'a str,
    pub document: Html,
    pub intercepted: &'a [InterceptedResponse],
}

impl<'a> ParsedPage<'a> {
    #[must_use]
    pub fn new(url: &'a str, html: &str, intercepted: &'a [InterceptedResponse]) -> Self {
        Self {
            url,
            document: Html::parse_document(html),
            intercepted,
        }
    }
}

/// Capability shared by all strategies: raw source in, candidates out
///
/// Implementations never fail past their boundary. Parse problems are logged
/// and reported as an empty list.
pub trait StrategyExtractor: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    fn extract(&self, page: &ParsedPage<'_>) -> Vec<RawJobCandidate>;
}

/// Result of running the chain on one page
#[derive(Debug, Default)]
pub struct ChainOutcome {
    /// Strategy that produced the candidates, `None` when all came up empty
    pub method: Option<ExtractionMethod>,
    pub candidates: Vec<RawJobCandidate>,
}

pub struct StrategyChain {
    extractors: Vec<Box<dyn StrategyExtractor>>,
}

impl StrategyChain {
    /// Custom chain, mainly for tests
    #[must_use]
    pub fn new(extractors: Vec<Box<dyn StrategyExtractor>>) -> Self {
        Self { extractors }
    }

    /// Hydration, structured data, markup. No live traffic to intercept.
    #[must_use]
    pub fn for_http(profile: &SiteProfile) -> Self {
        Self::new(vec![
            Box::new(HydrationExtractor::new(profile)),
            Box::new(JsonLdExtractor),
            Box::new(DomExtractor::new(profile)),
        ])
    }

    /// Intercepted traffic first, then the HTTP chain
    #[must_use]
    pub fn for_browser(profile: &SiteProfile) -> Self {
        Self::new(vec![
            Box::new(InterceptedExtractor::new(profile)),
            Box::new(HydrationExtractor::new(profile)),
            Box::new(JsonLdExtractor),
            Box::new(DomExtractor::new(profile)),
        ])
    }

    #[must_use]
    pub fn methods(&self) -> Vec<ExtractionMethod> {
        self.extractors.iter().map(|e| e.method()).collect()
    }

    #[must_use]
    pub fn run(&self, source: &PageSource<'_>) -> ChainOutcome {
        let page = ParsedPage::new(source.url, source.html, source.intercepted);
        for extractor in &self.extractors {
            let candidates = extractor.extract(&page);
            if !candidates.is_empty() {
                return ChainOutcome {
                    method: Some(extractor.method()),
                    candidates,
                };
            }
        }
        ChainOutcome::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LISTING: &str = r#"<html><head>
        <script id="__NEXT_DATA__" type="application/json">
          {"props":{"pageProps":{"jobs":[{"title":"From hydration","id":"h1"}]}}}
        </script>
        <script type="application/ld+json">{"@type":"JobPosting","title":"From JSON-LD"}</script>
        </head><body>
        <article class="job-card"><h2><a href="/job/d1">From DOM</a></h2></article>
        </body></html>"#;

    #[test]
    fn intercepted_traffic_beats_every_other_source() {
        let intercepted = vec![InterceptedResponse {
            url: "https://jobs.test/api/search".to_string(),
            content_type: Some("application/json".to_string()),
            body: json!({ "jobs": [{ "title": "From API" }] }).to_string(),
        }];
        let chain = StrategyChain::for_browser(&SiteProfile::default());
        let outcome = chain.run(&PageSource {
            url: "https://jobs.test/search",
            html: LISTING,
            intercepted: &intercepted,
        });
        assert_eq!(outcome.method, Some(ExtractionMethod::Intercepted));
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].payload["title"], json!("From API"));
    }

    #[test]
    fn falls_through_in_priority_order() {
        let chain = StrategyChain::for_http(&SiteProfile::default());
        let outcome = chain.run(&PageSource {
            url: "https://jobs.test/search",
            html: LISTING,
            intercepted: &[],
        });
        assert_eq!(outcome.method, Some(ExtractionMethod::Hydration));

        let without_state = LISTING.replace("__NEXT_DATA__", "other");
        let outcome = chain.run(&PageSource {
            url: "https://jobs.test/search",
            html: &without_state,
            intercepted: &[],
        });
        assert_eq!(outcome.method, Some(ExtractionMethod::JsonLd));
    }

    #[test]
    fn empty_page_reports_no_method() {
        let chain = StrategyChain::for_browser(&SiteProfile::default());
        let outcome = chain.run(&PageSource {
            url: "https://jobs.test/search",
            html: "<html><body><p>Nothing here</p></body></html>",
            intercepted: &[],
        });
        assert!(outcome.method.is_none());
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn http_chain_skips_interception() {
        let chain = StrategyChain::for_http(&SiteProfile::default());
        assert_eq!(
            chain.methods(),
            vec![ExtractionMethod::Hydration, ExtractionMethod::JsonLd, ExtractionMethod::Dom]
        );
    }
}
