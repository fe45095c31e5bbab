//! Input validation and clamping for `ScrapeConfig`

use log::warn;

use super::types::ScrapeConfig;
use crate::scrape_engine::errors::{ScrapeError, ScrapeResult};
use crate::utils::{
    MAX_BYPASS_ATTEMPTS, MAX_CONCURRENT_PAGES_CAP, MAX_ENRICHMENT_BATCH_SIZE, MAX_JOBS_CAP,
    MAX_PAGES_CAP, build_search_url, is_valid_url,
};

impl ScrapeConfig {
    /// Parse a JSON input object, then validate and clamp it
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError::InvalidInput` for malformed JSON, an unknown
    /// `sortBy` value or a failed validation.
    pub fn from_json(input: &str) -> ScrapeResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| ScrapeError::InvalidInput(format!("malformed input: {e}")))?;
        config.prepare()
    }

    /// Check that exactly one search source is set and that it is usable
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError::InvalidInput` describing the first violation.
    pub fn validate(&self) -> ScrapeResult<()> {
        let url = self.search_url.as_deref().map(str::trim).unwrap_or("");
        let query = self.search_query.as_deref().map(str::trim).unwrap_or("");

        match (url.is_empty(), query.is_empty()) {
            (true, true) => {
                return Err(ScrapeError::InvalidInput(
                    "one of searchUrl or searchQuery is required".to_string(),
                ));
            }
            (false, false) => {
                return Err(ScrapeError::InvalidInput(
                    "searchUrl and searchQuery are mutually exclusive".to_string(),
                ));
            }
            _ => {}
        }

        if !url.is_empty() && !is_valid_url(url) {
            return Err(ScrapeError::InvalidInput(format!(
                "searchUrl must be an absolute http(s) URL, got '{url}'"
            )));
        }

        if let Some(base) = self.search_base_url.as_deref() {
            if !is_valid_url(base) {
                return Err(ScrapeError::InvalidInput(format!(
                    "searchBaseUrl must be an absolute http(s) URL, got '{base}'"
                )));
            }
        }

        Ok(())
    }

    /// Validate, trim and clamp into a ready-to-run configuration
    ///
    /// Out-of-range numeric options are clamped with a warning rather than
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError::InvalidInput` when [`validate`](Self::validate) fails.
    pub fn prepare(mut self) -> ScrapeResult<Self> {
        self.validate()?;

        self.search_url = self.search_url.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.search_query = self
            .search_query
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.location = self.location.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        if self.max_jobs > MAX_JOBS_CAP {
            warn!("maxJobs {} exceeds cap, clamping to {MAX_JOBS_CAP}", self.max_jobs);
            self.max_jobs = MAX_JOBS_CAP;
        }
        if self.max_pages > MAX_PAGES_CAP {
            warn!("maxPages {} exceeds cap, clamping to {MAX_PAGES_CAP}", self.max_pages);
            self.max_pages = MAX_PAGES_CAP;
        }

        let batch = self.enrichment_batch_size.clamp(1, MAX_ENRICHMENT_BATCH_SIZE);
        if batch != self.enrichment_batch_size {
            warn!(
                "enrichmentBatchSize {} out of range, clamping to {batch}",
                self.enrichment_batch_size
            );
            self.enrichment_batch_size = batch;
        }

        let pages = self.max_concurrent_pages.clamp(1, MAX_CONCURRENT_PAGES_CAP);
        if pages != self.max_concurrent_pages {
            warn!(
                "maxConcurrentPages {} out of range, clamping to {pages}",
                self.max_concurrent_pages
            );
            self.max_concurrent_pages = pages;
        }

        if self.bypass_attempts > MAX_BYPASS_ATTEMPTS {
            warn!(
                "bypassAttempts {} exceeds cap, clamping to {MAX_BYPASS_ATTEMPTS}",
                self.bypass_attempts
            );
            self.bypass_attempts = MAX_BYPASS_ATTEMPTS;
        }

        self.max_consecutive_failures = self.max_consecutive_failures.max(1);
        self.page_load_timeout_secs = self.page_load_timeout_secs.max(1);
        self.navigation_timeout_secs = self.navigation_timeout_secs.max(1);

        Ok(self)
    }

    /// First listing page of the run
    ///
    /// `searchUrl` is used verbatim; otherwise the URL is built from the site
    /// profile (or the `searchBaseUrl` override) with keyword, location, page 1
    /// and the sort code.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL cannot be parsed.
    pub fn start_url(&self) -> ScrapeResult<String> {
        if let Some(url) = self.search_url.as_deref() {
            return Ok(url.to_string());
        }

        let query = self.search_query.as_deref().unwrap_or_default();
        let mut profile = self.site_profile.clone();
        if let Some(base) = &self.search_base_url {
            profile.search_base_url.clone_from(base);
        }

        build_search_url(&profile, query, self.location.as_deref(), self.sort_by)
            .map_err(|e| ScrapeError::InvalidInput(format!("cannot build search URL: {e:#}")))
    }
}
