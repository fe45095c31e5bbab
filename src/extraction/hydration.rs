//! Embedded hydration state extractor
//!
//! Server-rendered pages ship their application state as JSON inside a single
//! well-known script element. Known key paths are tried first; when the site
//! reshuffles its state tree, a bounded structural walk looks for any array of
//! job-shaped objects instead.

use scraper::Selector;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::chain::{ParsedPage, StrategyExtractor};
use super::lookup::value_at;
use super::schema::{ExtractionMethod, RawJobCandidate};
use crate::config::SiteProfile;

const TITLE_KEYS: &[&str] = &["title", "jobTitle", "positionTitle", "displayTitle", "name"];
const IDENTITY_KEYS: &[&str] = &[
    "id", "jobId", "jobKey", "jobkey", "url", "jobUrl", "link", "href", "slug", "uuid",
];

pub struct HydrationExtractor {
    script: Option<Selector>,
    key_paths: Vec<String>,
    max_depth: usize,
}

impl HydrationExtractor {
    #[must_use]
    pub fn new(profile: &SiteProfile) -> Self {
        let script = match Selector::parse(&profile.hydration_script_selector) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!(
                    "Invalid hydration script selector '{}': {e}",
                    profile.hydration_script_selector
                );
                None
            }
        };
        Self {
            script,
            key_paths: profile.hydration_key_paths.clone(),
            max_depth: profile.hydration_max_depth,
        }
    }

    /// Parse the hydration payload out of the page, if present
    fn state(&self, page: &ParsedPage<'_>) -> Option<Value> {
        let selector = self.script.as_ref()?;
        let element = page.document.select(selector).next()?;
        let raw: String = element.text().collect();
        match serde_json::from_str(raw.trim()) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!("Hydration script on {} is not valid JSON: {e}", page.url);
                None
            }
        }
    }

    /// Items from the first known key path holding a non-empty array
    fn from_key_paths<'v>(&self, state: &'v Value) -> Option<&'v Vec<Value>> {
        self.key_paths.iter().find_map(|path| {
            value_at(state, path)
                .and_then(Value::as_array)
                .filter(|items| !items.is_empty())
        })
    }
}

/// Has a title-like field and an id/URL-like field
#[must_use]
pub fn is_job_like(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    let has_title = TITLE_KEYS
        .iter()
        .any(|k| map.get(*k).and_then(Value::as_str).is_some_and(|s| !s.trim().is_empty()));
    let has_identity = IDENTITY_KEYS.iter().any(|k| match map.get(*k) {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    });
    has_title && has_identity
}

fn is_job_array(items: &[Value]) -> bool {
    let matching = items.iter().filter(|item| is_job_like(item)).count();
    matching > 0 && matching * 2 >= items.len()
}

/// Collect every job-shaped array reachable within `max_depth` levels
///
/// Iterative depth-first walk in document order. Visited nodes are tracked by
/// address so a repeated node is never expanded twice, and arrays that match
/// are not descended into.
#[must_use]
pub fn walk_for_job_arrays(root: &Value, max_depth: usize) -> Vec<&Value> {
    let mut found = Vec::new();
    let mut visited: HashSet<usize> = HashSet::new();
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];

    while let Some((node, depth)) = stack.pop() {
        if !visited.insert(std::ptr::from_ref(node) as usize) {
            continue;
        }

        match node {
            Value::Array(items) => {
                if is_job_array(items) {
                    found.extend(items.iter().filter(|item| is_job_like(item)));
                    continue;
                }
                if depth < max_depth {
                    stack.extend(items.iter().rev().map(|child| (child, depth + 1)));
                }
            }
            Value::Object(map) => {
                if depth < max_depth {
                    let children: Vec<&Value> = map.values().collect();
                    stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
                }
            }
            _ => {}
        }
    }

    found
}

impl StrategyExtractor for HydrationExtractor {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Hydration
    }

    fn extract(&self, page: &ParsedPage<'_>) -> Vec<RawJobCandidate> {
        let Some(state) = self.state(page) else {
            return Vec::new();
        };

        let items: Vec<&Value> = match self.from_key_paths(&state) {
            Some(items) => items.iter().collect(),
            None => {
                let walked = walk_for_job_arrays(&state, self.max_depth);
                debug!(
                    "No known hydration key path matched on {}, structural walk found {} items",
                    page.url,
                    walked.len()
                );
                walked
            }
        };

        items
            .into_iter()
            .filter(|item| item.is_object())
            .map(|item| RawJobCandidate::new(ExtractionMethod::Hydration, item.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn html_with_state(state: &Value) -> String {
        format!(
            r#"<html><body><script id="__NEXT_DATA__" type="application/json">{state}</script></body></html>"#
        )
    }

    fn run(html: &str) -> Vec<RawJobCandidate> {
        let extractor = HydrationExtractor::new(&SiteProfile::default());
        let page = ParsedPage::new("https://jobs.test/search", html, &[]);
        extractor.extract(&page)
    }

    #[test]
    fn known_key_path_wins() {
        let state = json!({ "props": { "pageProps": { "jobs": [
            { "title": "Engineer", "id": "1" },
            { "title": "Designer", "id": "2" }
        ] } } });
        let found = run(&html_with_state(&state));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].payload["title"], json!("Engineer"));
    }

    #[test]
    fn structural_walk_finds_reshuffled_state() {
        let state = json!({ "props": { "pageProps": { "dehydrated": { "queries": [
            { "state": { "data": { "edges": [
                { "jobTitle": "SRE", "jobKey": "abc" },
                { "jobTitle": "DBA", "jobKey": "def" }
            ] } } }
        ] } } } });
        let found = run(&html_with_state(&state));
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].payload["jobKey"], json!("def"));
    }

    #[test]
    fn walk_respects_depth_limit() {
        let deep = json!({ "a": { "b": { "c": { "jobs": [{ "title": "X", "id": 1 }] } } } });
        assert!(walk_for_job_arrays(&deep, 2).is_empty());
        assert_eq!(walk_for_job_arrays(&deep, 4).len(), 1);
    }

    #[test]
    fn arrays_without_identity_are_not_jobs() {
        let state = json!({ "nav": [{ "title": "Home" }, { "title": "About" }] });
        assert!(walk_for_job_arrays(&state, 10).is_empty());
    }

    #[test]
    fn malformed_state_yields_nothing() {
        let html = r#"<script id="__NEXT_DATA__">{"props": </script>"#;
        assert!(run(html).is_empty());
        assert!(run("<html><body>no state</body></html>").is_empty());
    }
}
