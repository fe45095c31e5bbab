//! Simple async scrape execution
//!
//! Wires the production collaborators (reqwest fetcher, chromiumoxide
//! launcher) around `run_scrape`. One proxy URL is chosen per run and shared
//! by the lightweight client and the browser.

use std::sync::Arc;

use super::errors::{ScrapeError, ScrapeResult};
use super::orchestrator::run_scrape;
use super::progress::{NoOpProgress, ProgressReporter};
use super::stats::RunSummary;
use crate::browser::ChromiumLauncher;
use crate::config::ScrapeConfig;
use crate::fetch::ReqwestFetcher;
use crate::sink::JobSink;
use crate::utils::DEFAULT_HTTP_TIMEOUT_MS;

/// Run a scrape with progress callbacks
pub async fn scrape_with_progress<P: ProgressReporter>(
    config: &ScrapeConfig,
    sink: Arc<dyn JobSink>,
    progress: &P,
) -> ScrapeResult<RunSummary> {
    config.validate()?;
    let proxy_url = config
        .proxy_configuration()
        .and_then(|proxy| proxy.next_proxy_url());

    let fetcher = ReqwestFetcher::new(proxy_url.as_deref(), DEFAULT_HTTP_TIMEOUT_MS)
        .map_err(|e| ScrapeError::Network(format!("{e:#}")))?;
    let launcher = ChromiumLauncher::from_config(config);

    run_scrape(
        config,
        proxy_url,
        &fetcher,
        &launcher,
        sink.as_ref(),
        progress,
    )
    .await
}

/// Run a scrape without progress reporting
///
/// Uses `NoOpProgress`, so all progress calls are inlined away.
pub async fn scrape_impl(config: &ScrapeConfig, sink: Arc<dyn JobSink>) -> ScrapeResult<RunSummary> {
    scrape_with_progress(config, sink, &NoOpProgress).await
}
