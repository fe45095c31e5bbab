pub mod antibot;
pub mod browser;
pub mod config;
pub mod extraction;
pub mod fetch;
pub mod scrape_engine;
pub mod sink;
pub mod utils;

pub use browser::{BrowserDriver, BrowserLauncher, BrowserVisit, ChromiumLauncher, VisitOutcome};
pub use config::{ProxyConfiguration, ScrapeConfig, ScrapeConfigBuilder, SiteProfile, SortBy};
pub use extraction::schema::*;
pub use fetch::{HttpFetcher, HttpPage, ReqwestFetcher, SessionState};
pub use scrape_engine::{
    LogProgress, NoOpProgress, ProgressReporter, RetrievalMode, RunSummary, ScrapeError,
    ScrapeResult, run_scrape, scrape_impl, scrape_with_progress,
};
pub use sink::{FsSink, JobSink, MemorySink};

use std::sync::Arc;

/// Scrape with the production fetcher, browser and a filesystem sink at `outputDir`
pub async fn scrape(config: ScrapeConfig) -> ScrapeResult<RunSummary> {
    let sink = FsSink::create(config.output_dir())
        .await
        .map_err(|e| ScrapeError::Sink(format!("{e:#}")))?;
    scrape_impl(&config, Arc::new(sink)).await
}
