//! Structured-data (`JobPosting`) extractor
//!
//! Accepts the wrapper shapes seen in the wild: a bare object, a top-level
//! array, an `@graph` container and an `ItemList` of `ListItem`s.

use scraper::Selector;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

use super::chain::{ParsedPage, StrategyExtractor};
use super::schema::{ExtractionMethod, RawJobCandidate};

static LD_JSON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type='application/ld+json']")
        .expect("BUG: hardcoded CSS selector for ld+json scripts is invalid")
});

/// Nesting allowed between wrappers before giving up
const MAX_WRAPPER_DEPTH: usize = 8;

#[derive(Debug, Default)]
pub struct JsonLdExtractor;

fn has_type(value: &Value, wanted: &str) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

/// Collect `JobPosting` objects from one parsed block, in document order
pub fn collect_postings<'v>(value: &'v Value, depth: usize, out: &mut Vec<&'v Value>) {
    if depth > MAX_WRAPPER_DEPTH {
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                collect_postings(item, depth + 1, out);
            }
        }
        Value::Object(map) => {
            if has_type(value, "JobPosting") {
                out.push(value);
                return;
            }
            if let Some(graph) = map.get("@graph") {
                collect_postings(graph, depth + 1, out);
            }
            if has_type(value, "ItemList") {
                if let Some(elements) = map.get("itemListElement") {
                    collect_postings(elements, depth + 1, out);
                }
            }
            if has_type(value, "ListItem") {
                if let Some(item) = map.get("item") {
                    collect_postings(item, depth + 1, out);
                }
            }
        }
        _ => {}
    }
}

/// Every `JobPosting` in the page's linked-data blocks
#[must_use]
pub fn postings_in(page: &ParsedPage<'_>) -> Vec<Value> {
    let mut postings = Vec::new();
    for script in page.document.select(&LD_JSON_SELECTOR) {
        let raw: String = script.text().collect();
        let parsed: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(e) => {
                debug!("Skipping malformed JSON-LD block on {}: {e}", page.url);
                continue;
            }
        };
        let mut found = Vec::new();
        collect_postings(&parsed, 0, &mut found);
        postings.extend(found.into_iter().cloned());
    }
    postings
}

impl StrategyExtractor for JsonLdExtractor {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::JsonLd
    }

    fn extract(&self, page: &ParsedPage<'_>) -> Vec<RawJobCandidate> {
        postings_in(page)
            .into_iter()
            .map(|posting| RawJobCandidate::new(ExtractionMethod::JsonLd, posting))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_with(blocks: &[Value]) -> String {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{b}</script>"#))
            .collect();
        format!("<html><head>{scripts}</head><body></body></html>")
    }

    fn run(html: &str) -> Vec<RawJobCandidate> {
        let page = ParsedPage::new("https://jobs.test/search", html, &[]);
        JsonLdExtractor.extract(&page)
    }

    #[test]
    fn graph_keeps_only_postings() {
        let html = page_with(&[json!({
            "@context": "https://schema.org",
            "@graph": [
                { "@type": "JobPosting", "title": "One" },
                { "@type": "Organization", "name": "Acme" },
                { "@type": "JobPosting", "title": "Two" }
            ]
        })]);
        let found = run(&html);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].payload["title"], json!("Two"));
    }

    #[test]
    fn supports_bare_array_and_item_list() {
        let html = page_with(&[
            json!({ "@type": "JobPosting", "title": "Bare" }),
            json!([{ "@type": "JobPosting", "title": "InArray" }]),
            json!({
                "@type": "ItemList",
                "itemListElement": [
                    { "@type": "ListItem", "position": 1, "item": { "@type": "JobPosting", "title": "Listed" } }
                ]
            }),
        ]);
        let titles: Vec<_> = run(&html).into_iter().map(|c| c.payload["title"].clone()).collect();
        assert_eq!(titles, vec![json!("Bare"), json!("InArray"), json!("Listed")]);
    }

    #[test]
    fn malformed_block_is_skipped_not_fatal() {
        let html = format!(
            r#"<script type="application/ld+json">{{oops</script>{}"#,
            page_with(&[json!({ "@type": ["JobPosting"], "title": "Ok" })])
        );
        assert_eq!(run(&html).len(), 1);
    }
}
