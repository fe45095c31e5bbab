//! Core configuration types for job scraping
//!
//! `ScrapeConfig` is the run's input object. It deserializes directly from the
//! camelCase JSON input (`searchUrl`, `maxJobs`, ...) and carries the tuning
//! knobs for both retrieval modes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::site_profile::SiteProfile;
use crate::utils::{
    DEFAULT_BYPASS_ATTEMPTS, DEFAULT_ENRICHMENT_BATCH_SIZE, DEFAULT_ENRICHMENT_PAUSE_MS,
    DEFAULT_MAX_CONCURRENT_PAGES, DEFAULT_MAX_CONSECUTIVE_FAILURES,
    DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
};

/// Result ordering requested from the search listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Site default ordering
    #[default]
    Relevance,
    /// Newest postings first
    Date,
}

/// Opaque proxy settings handed through to whatever manages outbound IPs
///
/// Only `proxyUrls` is interpreted: each call to [`next_proxy_url`] hands out
/// the next entry, round-robin. Every other key is preserved untouched.
///
/// [`next_proxy_url`]: ProxyConfiguration::next_proxy_url
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfiguration {
    #[serde(flatten)]
    raw: serde_json::Map<String, serde_json::Value>,

    #[serde(skip)]
    cursor: Arc<AtomicUsize>,
}

impl ProxyConfiguration {
    /// Wrap a raw JSON object
    #[must_use]
    pub fn from_raw(raw: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            raw,
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Raw passthrough object
    #[must_use]
    pub fn raw(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.raw
    }

    /// Explicit proxy URLs, in configured order
    #[must_use]
    pub fn proxy_urls(&self) -> Vec<String> {
        self.raw
            .get("proxyUrls")
            .and_then(|v| v.as_array())
            .map(|urls| {
                urls.iter()
                    .filter_map(|u| u.as_str())
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Next proxy URL in rotation, `None` when no explicit URLs are configured
    #[must_use]
    pub fn next_proxy_url(&self) -> Option<String> {
        let urls = self.proxy_urls();
        if urls.is_empty() {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % urls.len();
        urls.into_iter().nth(idx)
    }
}

/// Main configuration struct for a scrape run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrapeConfig {
    /// Absolute search URL. Short-circuits `search_query`, `location` and `sort_by`.
    pub(crate) search_url: Option<String>,
    pub(crate) search_query: Option<String>,
    pub(crate) location: Option<String>,

    /// Maximum records to emit. `0` means unbounded.
    pub(crate) max_jobs: usize,

    /// Maximum listing pages to process. `0` means unbounded.
    pub(crate) max_pages: usize,

    /// Disables the browser fallback entirely
    pub(crate) http_only: bool,
    pub(crate) sort_by: SortBy,
    pub(crate) proxy_configuration: Option<ProxyConfiguration>,

    /// Overrides the site profile's search base URL
    pub(crate) search_base_url: Option<String>,

    /// Re-fetch detail pages to replace listing snippets with full descriptions
    pub(crate) enrich_details: bool,
    pub(crate) enrichment_batch_size: usize,
    pub(crate) enrichment_pause_ms: u64,

    /// Concurrent page visits in browser mode
    /// Default: 3, Range: 1-10
    pub(crate) max_concurrent_pages: usize,
    pub(crate) headless: bool,

    /// Timeout in seconds for `page.goto()` operations
    pub(crate) page_load_timeout_secs: u64,

    /// Timeout in seconds for `page.wait_for_navigation()` operations
    pub(crate) navigation_timeout_secs: u64,

    /// Bypass rounds attempted on a challenged browser page
    pub(crate) bypass_attempts: u32,

    /// Consecutive failed or blocked pages before the run stops
    pub(crate) max_consecutive_failures: u32,

    /// Root directory of the filesystem sink
    pub(crate) output_dir: PathBuf,

    pub(crate) site_profile: SiteProfile,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            search_url: None,
            search_query: None,
            location: None,
            max_jobs: 0,
            max_pages: 0,
            http_only: false,
            sort_by: SortBy::Relevance,
            proxy_configuration: None,
            search_base_url: None,
            enrich_details: true,
            enrichment_batch_size: DEFAULT_ENRICHMENT_BATCH_SIZE,
            enrichment_pause_ms: DEFAULT_ENRICHMENT_PAUSE_MS,
            max_concurrent_pages: DEFAULT_MAX_CONCURRENT_PAGES,
            headless: true,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            bypass_attempts: DEFAULT_BYPASS_ATTEMPTS,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            output_dir: PathBuf::from("./storage"),
            site_profile: SiteProfile::default(),
        }
    }
}
