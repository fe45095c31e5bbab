//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;

use super::builder::ScrapeConfigBuilder;
use super::site_profile::SiteProfile;
use super::types::{ProxyConfiguration, SortBy};

impl<State> ScrapeConfigBuilder<State> {
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.inner.location = Some(location.into());
        self
    }

    /// Maximum records to emit, `0` for unbounded (clamped to 10 000)
    #[must_use]
    pub fn max_jobs(mut self, max_jobs: usize) -> Self {
        self.inner.max_jobs = max_jobs;
        self
    }

    /// Maximum listing pages, `0` for unbounded (clamped to 30)
    #[must_use]
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.inner.max_pages = max_pages;
        self
    }

    /// Disable the browser fallback
    ///
    /// With `http_only(true)` a block or an empty HTTP-first phase ends the
    /// run with whatever was collected so far.
    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.inner.http_only = http_only;
        self
    }

    #[must_use]
    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.inner.sort_by = sort_by;
        self
    }

    #[must_use]
    pub fn proxy_configuration(mut self, proxy: ProxyConfiguration) -> Self {
        self.inner.proxy_configuration = Some(proxy);
        self
    }

    #[must_use]
    pub fn search_base_url(mut self, url: impl Into<String>) -> Self {
        self.inner.search_base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn enrich_details(mut self, enrich: bool) -> Self {
        self.inner.enrich_details = enrich;
        self
    }

    #[must_use]
    pub fn enrichment_batch_size(mut self, size: usize) -> Self {
        self.inner.enrichment_batch_size = size;
        self
    }

    #[must_use]
    pub fn enrichment_pause_ms(mut self, pause_ms: u64) -> Self {
        self.inner.enrichment_pause_ms = pause_ms;
        self
    }

    #[must_use]
    pub fn max_concurrent_pages(mut self, pages: usize) -> Self {
        self.inner.max_concurrent_pages = pages;
        self
    }

    /// Set browser headless mode (visible vs invisible browser window)
    ///
    /// Headed mode is mostly useful for watching a challenge page while
    /// tuning `challenge_widget_selectors`.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.inner.headless = headless;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.inner.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.inner.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn bypass_attempts(mut self, attempts: u32) -> Self {
        self.inner.bypass_attempts = attempts;
        self
    }

    #[must_use]
    pub fn max_consecutive_failures(mut self, failures: u32) -> Self {
        self.inner.max_consecutive_failures = failures;
        self
    }

    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inner.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn site_profile(mut self, profile: SiteProfile) -> Self {
        self.inner.site_profile = profile;
        self
    }
}
