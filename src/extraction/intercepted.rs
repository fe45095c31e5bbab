//! Intercepted API traffic extractor
//!
//! Reads the search API responses the browser received while rendering the
//! page. Every matching response contributes, in arrival order: a single
//! listing page can fire several paginated API calls.

use serde_json::Value;
use tracing::debug;

use super::chain::{ParsedPage, StrategyExtractor};
use super::lookup::value_at;
use super::schema::{ExtractionMethod, InterceptedResponse, RawJobCandidate};
use crate::config::SiteProfile;

pub struct InterceptedExtractor {
    url_hints: Vec<String>,
    envelope_keys: Vec<String>,
}

impl InterceptedExtractor {
    #[must_use]
    pub fn new(profile: &SiteProfile) -> Self {
        Self {
            url_hints: profile
                .api_url_hints
                .iter()
                .map(|h| h.to_lowercase())
                .collect(),
            envelope_keys: profile.api_envelope_keys.clone(),
        }
    }

    /// Whether a response looks like a JSON search/query endpoint
    #[must_use]
    pub fn is_candidate(&self, response: &InterceptedResponse) -> bool {
        let is_json = response
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_lowercase().contains("json"));
        let url = response.url.to_lowercase();
        is_json && self.url_hints.iter().any(|hint| url.contains(hint.as_str()))
    }

    /// First non-empty array found at any envelope key, in key order
    fn job_array<'v>(&self, body: &'v Value) -> Option<&'v Vec<Value>> {
        self.envelope_keys.iter().find_map(|key| {
            value_at(body, key)
                .and_then(Value::as_array)
                .filter(|items| !items.is_empty())
        })
    }

    fn extract_response(&self, response: &InterceptedResponse) -> Vec<RawJobCandidate> {
        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) => {
                debug!("Unparseable intercepted body from {}: {e}", response.url);
                return Vec::new();
            }
        };

        // Batched GraphQL responses arrive as a top-level array of envelopes
        let envelopes: Vec<&Value> = match &body {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        envelopes
            .into_iter()
            .filter_map(|envelope| self.job_array(envelope))
            .flatten()
            .filter(|item| item.is_object())
            .map(|item| RawJobCandidate::new(ExtractionMethod::Intercepted, item.clone()))
            .collect()
    }
}

impl StrategyExtractor for InterceptedExtractor {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Intercepted
    }

    fn extract(&self, page: &ParsedPage<'_>) -> Vec<RawJobCandidate> {
        page.intercepted
            .iter()
            .filter(|response| self.is_candidate(response))
            .flat_map(|response| {
                let found = self.extract_response(response);
                debug!(
                    "Intercepted {} job items from {}",
                    found.len(),
                    response.url
                );
                found
            })
            .collect()
    }
}
