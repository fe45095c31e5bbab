//! Main scrape orchestration logic
//!
//! Coordinates one run:
//! - HTTP-first retrieval with escalation to the browser
//! - Per-page strategy chain, normalization and deduplication
//! - Detail enrichment before each page's records are written
//! - Stop conditions, statistics and the final summary

use log::{info, warn};
use std::fmt;

use super::diagnostics;
use super::enrichment::DetailEnricher;
use super::errors::{ScrapeError, ScrapeResult};
use super::http_mode::HttpModeExit;
use super::pagination::{NextPage, NextPageProbe, PageCursor};
use super::progress::ProgressReporter;
use super::state::SearchState;
use super::stats::{RetrievalMode, RunStatistics, RunSummary};
use crate::antibot::BlockDetector;
use crate::browser::BrowserLauncher;
use crate::config::ScrapeConfig;
use crate::extraction::{InterceptedResponse, JobRecord, Normalizer, PageSource, StrategyChain};
use crate::fetch::{HttpFetcher, SessionState};
use crate::sink::JobSink;

/// Why pagination ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    JobLimit,
    PageLimit,
    NoNewRecords,
    NoNextPage,
    TooManyFailures,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::JobLimit => "record limit reached",
            Self::PageLimit => "page limit reached",
            Self::NoNewRecords => "page yielded no new records",
            Self::NoNextPage => "no further page",
            Self::TooManyFailures => "too many consecutive failed pages",
        })
    }
}

/// Decision after one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PageStep {
    /// Keep going; in follow mode this carries the next page's URL
    Next(Option<String>),
    Stop(StopReason),
}

/// Where browser retrieval picks up
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BrowserStart {
    pub url: String,
    /// Page offset from the first listing page (page-param mode)
    pub offset: u32,
}

/// Run-scoped context shared by both retrieval modes
///
/// Only the control task touches it; concurrent page visits return their
/// results here instead of writing shared state.
pub(crate) struct RunContext<'a, P: ProgressReporter> {
    pub config: &'a ScrapeConfig,
    pub fetcher: &'a dyn HttpFetcher,
    pub sink: &'a dyn JobSink,
    pub progress: &'a P,
    pub state: SearchState,
    pub stats: RunStatistics,
    pub detector: BlockDetector,
    pub probe: NextPageProbe,
    /// Cookies and user agent reused by enrichment
    pub session: SessionState,
}

impl<'a, P: ProgressReporter> RunContext<'a, P> {
    fn new(
        config: &'a ScrapeConfig,
        fetcher: &'a dyn HttpFetcher,
        sink: &'a dyn JobSink,
        progress: &'a P,
    ) -> Self {
        let profile = config.site_profile();
        Self {
            config,
            fetcher,
            sink,
            progress,
            state: SearchState::new(config.job_limit(), config.page_limit()),
            stats: RunStatistics::new(),
            detector: BlockDetector::new(profile),
            probe: NextPageProbe::new(profile),
            session: SessionState::default(),
        }
    }

    /// 1-based number of the next listing page
    pub fn next_page_no(&self) -> u32 {
        u32::try_from(self.state.pages_processed + 1).unwrap_or(u32::MAX)
    }

    /// Run the chain on one retrieved page and emit its new records
    pub async fn emit_page(
        &mut self,
        mode: RetrievalMode,
        page_no: u32,
        url: &str,
        html: &str,
        intercepted: &[InterceptedResponse],
        chain: &StrategyChain,
        follow: bool,
    ) -> ScrapeResult<PageStep> {
        let config = self.config;
        let profile = config.site_profile();
        let outcome = chain.run(&PageSource {
            url,
            html,
            intercepted,
        });
        let next = self.probe.probe(html, url);
        self.state.page_processed();
        self.state.note_success();
        self.stats.pages_processed += 1;

        let Some(method) = outcome.method else {
            warn!("[{mode}] page {page_no} {url}: every strategy came up empty");
            diagnostics::save_empty_page(self.sink, mode, page_no, url, html, profile).await;
            self.progress.report_page_finished(page_no, 0);
            return Ok(self.after_page(0, &next, follow));
        };

        self.stats.record_strategy(method);
        self.state.method = Some(method);

        let raw = outcome.candidates.len();
        let (records, discarded) = Normalizer::new(url, profile.job_url_template.as_deref())
            .normalize_all(&outcome.candidates);
        let normalized = records.len();
        self.stats.candidates_discarded += discarded;

        let admission = self.state.admit_page(records);
        self.stats.duplicates_dropped += admission.duplicates;
        let mut records = admission.records;

        info!(
            "[{mode}] page {page_no} {url}: strategy={method}, raw={raw}, normalized={normalized}, new={}, duplicates={}",
            records.len(),
            admission.duplicates
        );
        if admission.over_budget > 0 {
            info!(
                "Dropped {} record(s) beyond the record limit",
                admission.over_budget
            );
        }

        let emitted = records.len();
        if emitted > 0 {
            if config.enrich_details() {
                self.enrich(&mut records).await;
            }
            self.write_records(&records).await?;
        }
        self.progress.report_page_finished(page_no, emitted);

        Ok(self.after_page(emitted, &next, follow))
    }

    async fn enrich(&mut self, records: &mut [JobRecord]) {
        let tally = DetailEnricher::new(
            self.fetcher,
            &self.session,
            &self.detector,
            self.config.site_profile(),
            self.config.enrichment_batch_size(),
            self.config.enrichment_pause(),
        )
        .enrich(records, self.progress)
        .await;

        self.stats.enrichment_succeeded += tally.succeeded;
        self.stats.enrichment_blocked += tally.blocked;
        self.stats.enrichment_failed += tally.failed;
    }

    async fn write_records(&mut self, records: &[JobRecord]) -> ScrapeResult<()> {
        self.sink
            .push_records(records)
            .await
            .map_err(|e| ScrapeError::Sink(format!("{e:#}")))?;
        self.stats.records_emitted += records.len();
        Ok(())
    }

    /// Stop conditions, checked in order after every processed page
    fn after_page(&self, emitted: usize, next: &NextPage, follow: bool) -> PageStep {
        if self.state.jobs_exhausted() {
            return PageStep::Stop(StopReason::JobLimit);
        }
        if self.state.pages_exhausted() {
            return PageStep::Stop(StopReason::PageLimit);
        }
        if emitted == 0 {
            return PageStep::Stop(StopReason::NoNewRecords);
        }
        match (follow, next) {
            (true, NextPage::Enabled { href: Some(href) }) => PageStep::Next(Some(href.clone())),
            (true, _) | (false, NextPage::Disabled) => PageStep::Stop(StopReason::NoNextPage),
            (false, _) => PageStep::Next(None),
        }
    }

    /// Count a page that failed or stayed blocked
    ///
    /// Page-param mode skips it; follow mode has no way forward.
    pub fn page_failed(&mut self, follow: bool) -> PageStep {
        self.state.page_processed();
        self.stats.pages_processed += 1;
        self.stats.failed_pages += 1;
        let streak = self.state.note_failure();

        if streak >= self.config.max_consecutive_failures() {
            return PageStep::Stop(StopReason::TooManyFailures);
        }
        if self.state.pages_exhausted() {
            return PageStep::Stop(StopReason::PageLimit);
        }
        if follow {
            PageStep::Stop(StopReason::NoNextPage)
        } else {
            PageStep::Next(None)
        }
    }

    /// Forget the HTTP pass before the browser starts over from the first page
    fn restart_pagination(&mut self) {
        self.state = SearchState::new(self.config.job_limit(), self.config.page_limit());
        self.stats.pages_processed = 0;
    }

    async fn execute(
        &mut self,
        start_url: &str,
        launcher: &dyn BrowserLauncher,
        proxy_url: Option<String>,
    ) -> ScrapeResult<()> {
        let cursor = PageCursor::for_start_url(start_url, self.config.site_profile());

        let (start, reason) = match self.run_http(&cursor, start_url).await? {
            HttpModeExit::Finished => return Ok(()),
            HttpModeExit::Blocked { start, reason } => (start, reason),
            HttpModeExit::NoRecords => {
                self.restart_pagination();
                let start = BrowserStart {
                    url: start_url.to_string(),
                    offset: 0,
                };
                (start, "lightweight requests produced no records".to_string())
            }
        };

        if self.config.http_only() {
            info!("Browser fallback disabled ({reason}); ending run");
            return Ok(());
        }

        self.progress.report_escalated(&reason);
        info!("Escalating to browser retrieval at {}: {reason}", start.url);
        let driver = launcher
            .launch(proxy_url)
            .await
            .map_err(|e| ScrapeError::Browser(format!("{e:#}")))?;

        let result = self.run_browser(driver.as_ref(), &cursor, start).await;
        driver.shutdown().await;
        result
    }
}

/// Run one scrape end to end
///
/// The same `proxy_url` must already be configured on `fetcher`; it is handed
/// to the browser if one gets launched. The summary is persisted even when
/// the run fails part-way.
///
/// # Arguments
/// * `config` - Validated run configuration
/// * `proxy_url` - Outbound proxy chosen for this run
/// * `fetcher` - Lightweight HTTP client
/// * `launcher` - Starts a browser on first escalation
/// * `sink` - Dataset, diagnostics and summary output
/// * `progress` - Lifecycle callbacks
pub async fn run_scrape<P: ProgressReporter>(
    config: &ScrapeConfig,
    proxy_url: Option<String>,
    fetcher: &dyn HttpFetcher,
    launcher: &dyn BrowserLauncher,
    sink: &dyn JobSink,
    progress: &P,
) -> ScrapeResult<RunSummary> {
    config.validate()?;
    let start_url = config.start_url()?;
    progress.report_run_started(&start_url);
    info!("Starting scrape at {start_url}");

    let mut ctx = RunContext::new(config, fetcher, sink, progress);
    let result = ctx.execute(&start_url, launcher, proxy_url).await;

    let summary = ctx.stats.summary();
    if let Err(e) = sink.save_summary(&summary).await {
        warn!("Failed to save run summary: {e:#}");
    }

    match result {
        Ok(()) => {
            info!(
                "Run finished: {} record(s), {} page(s), strategy {}, {} duplicate(s) dropped, {} ms",
                summary.records_emitted,
                summary.pages_processed,
                summary
                    .extraction_method
                    .map_or("none", |m| m.label()),
                summary.duplicates_dropped,
                summary.duration_ms
            );
            progress.report_completed(&summary);
            Ok(summary)
        }
        Err(e) => {
            progress.report_error(&e.to_string());
            Err(e)
        }
    }
}
