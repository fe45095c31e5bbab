//! Browser-based retrieval
//!
//! Page-param listings are visited in windows of up to `maxConcurrentPages`
//! concurrent visits. Results are processed strictly in page order by the
//! control task; anything a stop condition makes redundant is discarded.
//! Follow-mode listings are visited one at a time because each next URL is
//! only known after the previous page.

use anyhow::Result;
use futures::future::join_all;
use log::{info, warn};

use super::diagnostics;
use super::errors::{FailureKind, ScrapeResult};
use super::orchestrator::{BrowserStart, PageStep, RunContext};
use super::pagination::PageCursor;
use super::progress::ProgressReporter;
use super::stats::RetrievalMode;
use crate::browser::{BrowserDriver, BrowserVisit, VisitOutcome};
use crate::extraction::StrategyChain;

impl<P: ProgressReporter> RunContext<'_, P> {
    pub(crate) async fn run_browser(
        &mut self,
        driver: &dyn BrowserDriver,
        cursor: &PageCursor,
        start: BrowserStart,
    ) -> ScrapeResult<()> {
        self.stats.record_mode(RetrievalMode::Browser);
        let chain = StrategyChain::for_browser(self.config.site_profile());

        if cursor.is_page_param() {
            self.browse_page_param(driver, cursor, start.offset, &chain).await
        } else {
            self.browse_follow(driver, start.url, &chain).await
        }
    }

    async fn browse_page_param(
        &mut self,
        driver: &dyn BrowserDriver,
        cursor: &PageCursor,
        mut offset: u32,
        chain: &StrategyChain,
    ) -> ScrapeResult<()> {
        let concurrency = self.config.max_concurrent_pages().max(1);

        loop {
            if self.state.budget_exhausted() {
                return Ok(());
            }
            let window = self
                .state
                .remaining_pages()
                .map_or(concurrency, |left| left.min(concurrency));
            let window = u32::try_from(window).unwrap_or(u32::MAX);

            let mut urls = Vec::with_capacity(window as usize);
            for step in 0..window {
                match offset.checked_add(step) {
                    Some(page_offset) => match cursor.page_url(page_offset)? {
                        Some(url) => urls.push(url),
                        None => break,
                    },
                    None => break,
                }
            }
            if urls.is_empty() {
                info!("[browser] page number out of range; stopping");
                return Ok(());
            }
            for (i, url) in urls.iter().enumerate() {
                let page_no = self.next_page_no().saturating_add(u32::try_from(i).unwrap_or(0));
                self.progress
                    .report_page_started(RetrievalMode::Browser, page_no, url);
            }

            let visits = join_all(urls.iter().map(|url| driver.visit(url))).await;

            for (url, visit) in urls.iter().zip(visits) {
                let page_no = self.next_page_no();
                match self
                    .process_visit(driver, page_no, url, visit, chain, false)
                    .await?
                {
                    PageStep::Next(_) => {}
                    PageStep::Stop(reason) => {
                        info!("[browser] pagination stopped after page {page_no}: {reason}");
                        return Ok(());
                    }
                }
            }
            match offset.checked_add(window) {
                Some(next) if urls.len() == window as usize => offset = next,
                _ => return Ok(()),
            }
        }
    }

    async fn browse_follow(
        &mut self,
        driver: &dyn BrowserDriver,
        mut url: String,
        chain: &StrategyChain,
    ) -> ScrapeResult<()> {
        loop {
            if self.state.budget_exhausted() {
                return Ok(());
            }
            let page_no = self.next_page_no();
            self.progress
                .report_page_started(RetrievalMode::Browser, page_no, &url);

            let visit = driver.visit(&url).await;
            match self
                .process_visit(driver, page_no, &url, visit, chain, true)
                .await?
            {
                PageStep::Next(Some(next)) => url = next,
                PageStep::Next(None) => return Ok(()),
                PageStep::Stop(reason) => {
                    info!("[browser] pagination stopped after page {page_no}: {reason}");
                    return Ok(());
                }
            }
        }
    }

    async fn process_visit(
        &mut self,
        driver: &dyn BrowserDriver,
        page_no: u32,
        url: &str,
        visit: Result<BrowserVisit>,
        chain: &StrategyChain,
        follow: bool,
    ) -> ScrapeResult<PageStep> {
        let visit = match visit {
            Ok(visit) => visit,
            Err(e) => {
                let kind = FailureKind::classify(&e);
                warn!(
                    "[browser] page {page_no} {url} failed ({}): {e:#}",
                    kind.label()
                );
                self.progress.report_error(&format!("{e:#}"));
                return Ok(self.page_failed(follow));
            }
        };

        self.stats.bypass_rounds += visit.outcome.bypass_rounds();
        if let VisitOutcome::Blocked { reason, .. } = &visit.outcome {
            self.stats.browser_blocked_pages += 1;
            self.progress.report_blocked(url, reason);
            diagnostics::save_blocked_page(
                self.sink,
                RetrievalMode::Browser,
                page_no,
                &visit.html,
                visit.screenshot.as_deref(),
            )
            .await;
            return Ok(self.page_failed(follow));
        }

        self.session = driver.session_state().await;
        self.emit_page(
            RetrievalMode::Browser,
            page_no,
            &visit.final_url,
            &visit.html,
            &visit.intercepted,
            chain,
            follow,
        )
        .await
    }
}
