//! HTTP-first retrieval
//!
//! Lightweight requests for consecutive listing pages. Any block ends this
//! mode at once; the blocked page is handed to the browser.

use log::{info, warn};

use super::diagnostics;
use super::errors::{FailureKind, ScrapeResult};
use super::orchestrator::{BrowserStart, PageStep, RunContext};
use super::pagination::PageCursor;
use super::progress::ProgressReporter;
use super::stats::RetrievalMode;
use crate::extraction::StrategyChain;

/// How HTTP-first mode ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HttpModeExit {
    /// A stop condition ended the run with records emitted
    Finished,
    /// A block signature was hit; the browser resumes at `start`
    Blocked { start: BrowserStart, reason: String },
    /// Nothing was emitted; the browser starts over from the first page
    NoRecords,
}

impl<P: ProgressReporter> RunContext<'_, P> {
    pub(crate) async fn run_http(
        &mut self,
        cursor: &PageCursor,
        start_url: &str,
    ) -> ScrapeResult<HttpModeExit> {
        let chain = StrategyChain::for_http(self.config.site_profile());
        let follow = !cursor.is_page_param();
        self.stats.record_mode(RetrievalMode::Http);

        let mut url = start_url.to_string();
        loop {
            if self.state.budget_exhausted() {
                break;
            }
            let page_no = self.next_page_no();
            let offset = page_no - 1;
            match cursor.page_url(offset)? {
                Some(page_url) => url = page_url,
                None if follow => {}
                None => {
                    info!("[http] page offset {offset} overflows the page number; stopping");
                    break;
                }
            }
            self.progress.report_page_started(RetrievalMode::Http, page_no, &url);

            let fetched = self.fetcher.get(&url, &self.session).await;
            let step = match fetched {
                Err(e) => {
                    let kind = FailureKind::classify(&e);
                    warn!("[http] page {page_no} {url} failed ({}): {e:#}", kind.label());
                    self.progress.report_error(&format!("{e:#}"));
                    self.page_failed(follow)
                }
                Ok(page) => {
                    let verdict = self.detector.inspect_http(page.status, &page.body);
                    if let Some(reason) = verdict.reason() {
                        self.stats.http_blocks += 1;
                        self.progress.report_blocked(&url, reason);
                        warn!("[http] page {page_no} {url} blocked: {reason}");
                        diagnostics::save_blocked_page(
                            self.sink,
                            RetrievalMode::Http,
                            page_no,
                            &page.body,
                            None,
                        )
                        .await;
                        return Ok(HttpModeExit::Blocked {
                            start: BrowserStart { url, offset },
                            reason: reason.to_string(),
                        });
                    }

                    if (200..300).contains(&page.status) {
                        self.emit_page(
                            RetrievalMode::Http,
                            page_no,
                            &page.final_url,
                            &page.body,
                            &[],
                            &chain,
                            follow,
                        )
                        .await?
                    } else {
                        warn!("[http] page {page_no} {url} answered HTTP {}", page.status);
                        self.page_failed(follow)
                    }
                }
            };

            self.stats.http_pages += 1;

            match step {
                PageStep::Next(Some(next)) => url = next,
                PageStep::Next(None) => {}
                PageStep::Stop(reason) => {
                    info!("[http] pagination stopped after page {page_no}: {reason}");
                    break;
                }
            }
        }

        if self.state.records_emitted == 0 {
            Ok(HttpModeExit::NoRecords)
        } else {
            Ok(HttpModeExit::Finished)
        }
    }
}
