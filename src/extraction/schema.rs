use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Canonical output unit, one per posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    /// Free text, comma-joined from structured address parts when available
    pub location: String,
    /// Free text or "Not specified"
    pub salary: String,
    /// Free text or "Not specified"
    pub job_type: String,
    /// Source-supplied text, never parsed into a date
    pub posted_date: String,
    pub description_html: String,
    /// Always derived from `description_html`
    pub description_text: String,
    /// Absolute URL, primary identity key
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

impl JobRecord {
    /// Identity used for run-wide deduplication
    ///
    /// The URL when present, otherwise `title|company|location` lowercased.
    #[must_use]
    pub fn identity_key(&self) -> String {
        if self.url.is_empty() {
            format!(
                "{}|{}|{}",
                self.title.to_lowercase(),
                self.company.to_lowercase(),
                self.location.to_lowercase()
            )
        } else {
            self.url.clone()
        }
    }
}

/// Strategy that produced a candidate, in chain priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Search API responses observed during browser navigation
    Intercepted,
    /// Server-rendered application state embedded in a script element
    Hydration,
    /// `JobPosting` linked-data blocks
    JsonLd,
    /// Listing cards in the markup
    Dom,
}

impl ExtractionMethod {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Intercepted => "intercepted",
            Self::Hydration => "hydration",
            Self::JsonLd => "json_ld",
            Self::Dom => "dom",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Untyped job-like object, consumed once by the normalizer
#[derive(Debug, Clone, PartialEq)]
pub struct RawJobCandidate {
    pub method: ExtractionMethod,
    pub payload: Value,
}

impl RawJobCandidate {
    #[must_use]
    pub fn new(method: ExtractionMethod, payload: Value) -> Self {
        Self { method, payload }
    }
}

/// Response body observed by the browser while a page was loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedResponse {
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

/// Everything a strategy chain may read for one listing page
#[derive(Debug, Clone, Copy)]
pub struct PageSource<'a> {
    /// Final URL after redirects, base for relative links
    pub url: &'a str,
    pub html: &'a str,
    /// Empty in HTTP mode
    pub intercepted: &'a [InterceptedResponse],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str) -> JobRecord {
        JobRecord {
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Berlin, DE".to_string(),
            salary: "Not specified".to_string(),
            job_type: "Not specified".to_string(),
            posted_date: String::new(),
            description_html: String::new(),
            description_text: String::new(),
            url: url.to_string(),
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn identity_prefers_url() {
        assert_eq!(record("https://jobs.test/job/1").identity_key(), "https://jobs.test/job/1");
        assert_eq!(record("").identity_key(), "rust engineer|acme|berlin, de");
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(record("https://jobs.test/job/1")).expect("json");
        assert!(json.get("jobType").is_some());
        assert!(json.get("descriptionText").is_some());
        assert!(json.get("scrapedAt").is_some());
    }
}
