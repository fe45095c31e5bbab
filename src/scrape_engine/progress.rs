//! Progress reporting abstraction for scrape runs
//!
//! Defines the `ProgressReporter` trait for lifecycle event reporting
//! and provides a no-op and a logging implementation.

use log::{info, warn};

use super::stats::{RetrievalMode, RunSummary};

/// Trait for reporting scrape progress at key lifecycle events
///
/// Implementations can send updates to channels, log to console, update UI, etc.
pub trait ProgressReporter: Send + Sync {
    /// Report that the run has started from `start_url`
    fn report_run_started(&self, start_url: &str);

    /// Report that a listing page is about to be retrieved
    fn report_page_started(&self, mode: RetrievalMode, page: u32, url: &str);

    /// Report how many new records a listing page contributed
    fn report_page_finished(&self, page: u32, records: usize);

    /// Report that a page ended behind an anti-bot challenge
    fn report_blocked(&self, url: &str, reason: &str);

    /// Report the switch from lightweight requests to the browser
    fn report_escalated(&self, reason: &str);

    /// Report one finished enrichment batch
    fn report_enrichment_batch(&self, enriched: usize, batch_size: usize);

    /// Report that the run has completed
    fn report_completed(&self, summary: &RunSummary);

    /// Report an error that occurred during the run
    fn report_error(&self, error: &str);
}

/// Progress reporter that does nothing
///
/// All methods are no-ops and will be inlined away by the compiler.
#[derive(Debug, Clone, Copy)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_run_started(&self, _start_url: &str) {}

    #[inline(always)]
    fn report_page_started(&self, _mode: RetrievalMode, _page: u32, _url: &str) {}

    #[inline(always)]
    fn report_page_finished(&self, _page: u32, _records: usize) {}

    #[inline(always)]
    fn report_blocked(&self, _url: &str, _reason: &str) {}

    #[inline(always)]
    fn report_escalated(&self, _reason: &str) {}

    #[inline(always)]
    fn report_enrichment_batch(&self, _enriched: usize, _batch_size: usize) {}

    #[inline(always)]
    fn report_completed(&self, _summary: &RunSummary) {}

    #[inline(always)]
    fn report_error(&self, _error: &str) {}
}

/// Progress reporter that writes one log line per event
#[derive(Debug, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report_run_started(&self, start_url: &str) {
        info!("Scrape started: {start_url}");
    }

    fn report_page_started(&self, mode: RetrievalMode, page: u32, url: &str) {
        info!("[{mode}] page {page}: {url}");
    }

    fn report_page_finished(&self, page: u32, records: usize) {
        info!("Page {page} contributed {records} new record(s)");
    }

    fn report_blocked(&self, url: &str, reason: &str) {
        warn!("Blocked at {url}: {reason}");
    }

    fn report_escalated(&self, reason: &str) {
        info!("Escalating to browser retrieval: {reason}");
    }

    fn report_enrichment_batch(&self, enriched: usize, batch_size: usize) {
        info!("Enrichment batch: {enriched}/{batch_size} record(s) enriched");
    }

    fn report_completed(&self, summary: &RunSummary) {
        info!(
            "Scrape completed: {} record(s) from {} page(s) in {} ms",
            summary.records_emitted, summary.pages_processed, summary.duration_ms
        );
    }

    fn report_error(&self, error: &str) {
        warn!("Scrape error: {error}");
    }
}
