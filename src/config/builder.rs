//! Type-safe builder for `ScrapeConfig` using the typestate pattern
//!
//! A search source (query or URL) must be chosen before `build()` becomes
//! available. `build()` runs the same validation and clamping as a config
//! deserialized from JSON input.

use std::marker::PhantomData;

use super::types::ScrapeConfig;
use crate::scrape_engine::errors::ScrapeResult;

// Type states for the builder
pub struct WithSearch;

pub struct ScrapeConfigBuilder<State = ()> {
    pub(crate) inner: ScrapeConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScrapeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            inner: ScrapeConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder<()> {
        ScrapeConfigBuilder::default()
    }
}

impl ScrapeConfigBuilder<()> {
    /// Search by keyword, the URL is built from the site profile
    pub fn search_query(mut self, query: impl Into<String>) -> ScrapeConfigBuilder<WithSearch> {
        self.inner.search_query = Some(query.into());
        ScrapeConfigBuilder {
            inner: self.inner,
            _phantom: PhantomData,
        }
    }

    /// Start from an explicit search results URL
    pub fn search_url(mut self, url: impl Into<String>) -> ScrapeConfigBuilder<WithSearch> {
        self.inner.search_url = Some(url.into());
        ScrapeConfigBuilder {
            inner: self.inner,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when a search source is set
impl ScrapeConfigBuilder<WithSearch> {
    /// Validate and clamp the configuration
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError::InvalidInput` when the search source is missing,
    /// ambiguous or malformed.
    pub fn build(self) -> ScrapeResult<ScrapeConfig> {
        self.inner.prepare()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortBy;

    #[test]
    fn builds_query_config_with_overrides() {
        let config = ScrapeConfig::builder()
            .search_query("data engineer")
            .location("Remote")
            .max_jobs(50)
            .sort_by(SortBy::Date)
            .http_only(true)
            .build()
            .expect("valid config");

        assert_eq!(config.search_query(), Some("data engineer"));
        assert_eq!(config.max_jobs(), 50);
        assert!(config.http_only());
        assert_eq!(config.sort_by(), SortBy::Date);
    }

    #[test]
    fn rejects_malformed_search_url() {
        let err = ScrapeConfig::builder()
            .search_url("not a url")
            .build()
            .expect_err("should fail");
        assert!(err.is_fatal_input());
    }
}
