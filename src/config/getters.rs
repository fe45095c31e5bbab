//! Getter methods for `ScrapeConfig`
//!
//! This module provides all the accessor methods for retrieving configuration
//! values from a `ScrapeConfig` instance.

use std::path::PathBuf;
use std::time::Duration;

use super::site_profile::SiteProfile;
use super::types::{ProxyConfiguration, ScrapeConfig, SortBy};

impl ScrapeConfig {
    #[must_use]
    pub fn search_url(&self) -> Option<&str> {
        self.search_url.as_deref()
    }

    #[must_use]
    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    #[must_use]
    pub fn max_jobs(&self) -> usize {
        self.max_jobs
    }

    #[must_use]
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// `maxJobs` as an optional limit, `None` when unbounded
    #[must_use]
    pub fn job_limit(&self) -> Option<usize> {
        (self.max_jobs > 0).then_some(self.max_jobs)
    }

    /// `maxPages` as an optional limit, `None` when unbounded
    #[must_use]
    pub fn page_limit(&self) -> Option<usize> {
        (self.max_pages > 0).then_some(self.max_pages)
    }

    #[must_use]
    pub fn http_only(&self) -> bool {
        self.http_only
    }

    #[must_use]
    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    #[must_use]
    pub fn proxy_configuration(&self) -> Option<&ProxyConfiguration> {
        self.proxy_configuration.as_ref()
    }

    #[must_use]
    pub fn enrich_details(&self) -> bool {
        self.enrich_details
    }

    #[must_use]
    pub fn enrichment_batch_size(&self) -> usize {
        self.enrichment_batch_size
    }

    #[must_use]
    pub fn enrichment_pause(&self) -> Duration {
        Duration::from_millis(self.enrichment_pause_ms)
    }

    #[must_use]
    pub fn max_concurrent_pages(&self) -> usize {
        self.max_concurrent_pages
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn page_load_timeout_secs(&self) -> u64 {
        self.page_load_timeout_secs
    }

    #[must_use]
    pub fn navigation_timeout_secs(&self) -> u64 {
        self.navigation_timeout_secs
    }

    #[must_use]
    pub fn bypass_attempts(&self) -> u32 {
        self.bypass_attempts
    }

    #[must_use]
    pub fn max_consecutive_failures(&self) -> u32 {
        self.max_consecutive_failures
    }

    #[must_use]
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    #[must_use]
    pub fn site_profile(&self) -> &SiteProfile {
        &self.site_profile
    }
}
