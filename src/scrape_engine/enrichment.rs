//! Detail-page enrichment
//!
//! Replaces listing snippets with full descriptions by re-fetching each
//! record's detail page with the run's session cookies and user agent.
//! Strictly best-effort: a record is never removed or failed here.

use futures::future::join_all;
use log::{debug, info};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

use super::progress::ProgressReporter;
use crate::antibot::BlockDetector;
use crate::config::SiteProfile;
use crate::extraction::json_ld::collect_postings;
use crate::extraction::lookup::{compile_selectors, first_element, first_text, raw_string, value_at};
use crate::extraction::normalizer::employment_type;
use crate::extraction::JobRecord;
use crate::fetch::{HttpFetcher, SessionState};
use crate::utils::{NOT_SPECIFIED, strip_html};

/// Outcome of one detail fetch, merged into its record immediately
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentResult {
    Enriched {
        description_html: String,
        description_text: String,
        job_type: Option<String>,
    },
    Blocked,
    /// Fetch failed or the page had nothing usable
    Unavailable,
}

/// Per-run enrichment counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentTally {
    pub succeeded: usize,
    pub blocked: usize,
    pub failed: usize,
}

impl EnrichmentTally {
    fn count(&mut self, result: &EnrichmentResult) {
        match result {
            EnrichmentResult::Enriched { .. } => self.succeeded += 1,
            EnrichmentResult::Blocked => self.blocked += 1,
            EnrichmentResult::Unavailable => self.failed += 1,
        }
    }
}

/// Fields read from a detail page
#[derive(Debug, Default, PartialEq, Eq)]
struct DetailFields {
    description_html: Option<String>,
    job_type: Option<String>,
}

static LD_JSON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type='application/ld+json']")
        .expect("BUG: hardcoded CSS selector for ld+json scripts is invalid")
});

pub struct DetailEnricher<'a> {
    fetcher: &'a dyn HttpFetcher,
    session: &'a SessionState,
    detector: &'a BlockDetector,
    description_selectors: Vec<Selector>,
    job_type_selectors: Vec<Selector>,
    batch_size: usize,
    pause: Duration,
}

impl<'a> DetailEnricher<'a> {
    #[must_use]
    pub fn new(
        fetcher: &'a dyn HttpFetcher,
        session: &'a SessionState,
        detector: &'a BlockDetector,
        profile: &SiteProfile,
        batch_size: usize,
        pause: Duration,
    ) -> Self {
        Self {
            fetcher,
            session,
            detector,
            description_selectors: compile_selectors(&profile.detail_description_selectors),
            job_type_selectors: compile_selectors(&profile.detail_job_type_selectors),
            batch_size: batch_size.max(1),
            pause,
        }
    }

    /// Parse description and job type out of detail markup
    ///
    /// Profile selectors win over the JSON-LD description; JSON-LD
    /// `employmentType` wins over selector text for the job type.
    fn parse_detail(&self, html: &str) -> DetailFields {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let mut postings = Vec::new();
        let blocks: Vec<serde_json::Value> = document
            .select(&LD_JSON_SELECTOR)
            .filter_map(|s| serde_json::from_str(s.text().collect::<String>().trim()).ok())
            .collect();
        for block in &blocks {
            collect_postings(block, 0, &mut postings);
        }
        let posting = postings.first();

        let description_html = first_element(root, &self.description_selectors)
            .map(|el| el.inner_html().trim().to_string())
            .filter(|html| !strip_html(html).is_empty())
            .or_else(|| {
                posting
                    .and_then(|p| value_at(p, "description"))
                    .and_then(raw_string)
                    .filter(|html| !strip_html(html).is_empty())
            });

        let job_type = posting
            .and_then(|p| employment_type(p))
            .or_else(|| first_text(root, &self.job_type_selectors));

        DetailFields {
            description_html,
            job_type,
        }
    }

    /// Fetch and parse one detail page
    pub async fn fetch_detail(&self, url: &str) -> EnrichmentResult {
        let page = match self.fetcher.get(url, self.session).await {
            Ok(page) => page,
            Err(e) => {
                debug!("Detail fetch failed for {url}: {e:#}");
                return EnrichmentResult::Unavailable;
            }
        };

        if let Some(reason) = self.detector.inspect_http(page.status, &page.body).reason() {
            info!("Detail page blocked at {url}: {reason}");
            return EnrichmentResult::Blocked;
        }
        if !(200..300).contains(&page.status) {
            debug!("Detail page {url} answered HTTP {}", page.status);
            return EnrichmentResult::Unavailable;
        }

        let fields = self.parse_detail(&page.body);
        match fields.description_html {
            Some(description_html) => EnrichmentResult::Enriched {
                description_text: strip_html(&description_html),
                description_html,
                job_type: fields.job_type,
            },
            None => {
                debug!("No description found on detail page {url}");
                EnrichmentResult::Unavailable
            }
        }
    }

    /// Merge a result into its record; anything but `Enriched` leaves it untouched
    pub fn merge(record: &mut JobRecord, result: EnrichmentResult) {
        if let EnrichmentResult::Enriched {
            description_html,
            description_text,
            job_type,
        } = result
        {
            record.description_html = description_html;
            record.description_text = description_text;
            if record.job_type == NOT_SPECIFIED {
                if let Some(job_type) = job_type {
                    record.job_type = job_type;
                }
            }
        }
    }

    /// Enrich records in place, one fixed-size concurrent batch at a time
    ///
    /// Records without a URL are skipped. Order is never changed.
    pub async fn enrich<P: ProgressReporter>(
        &self,
        records: &mut [JobRecord],
        progress: &P,
    ) -> EnrichmentTally {
        let mut tally = EnrichmentTally::default();
        let targets: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.url.is_empty())
            .map(|(i, _)| i)
            .collect();

        let batches: Vec<&[usize]> = targets.chunks(self.batch_size).collect();
        for (n, batch) in batches.iter().enumerate() {
            if n > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            let urls: Vec<String> = batch.iter().map(|&i| records[i].url.clone()).collect();
            let results = join_all(urls.iter().map(|url| self.fetch_detail(url))).await;

            let before = tally.succeeded;
            for (&index, result) in batch.iter().zip(results) {
                tally.count(&result);
                Self::merge(&mut records[index], result);
            }
            progress.report_enrichment_batch(tally.succeeded - before, batch.len());
        }

        if !targets.is_empty() {
            info!(
                "Enrichment: {} enriched, {} blocked, {} unavailable",
                tally.succeeded, tally.blocked, tally.failed
            );
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HttpPage;
    use crate::scrape_engine::progress::NoOpProgress;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct DetailPages {
        pages: HashMap<String, (u16, String)>,
        requests: Mutex<Vec<String>>,
    }

    impl DetailPages {
        fn new(pages: &[(&str, u16, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, s, b)| ((*u).to_string(), (*s, (*b).to_string())))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpFetcher for DetailPages {
        async fn get(&self, url: &str, _session: &SessionState) -> Result<HttpPage> {
            self.requests.lock().expect("lock").push(url.to_string());
            match self.pages.get(url) {
                Some((status, body)) => Ok(HttpPage {
                    status: *status,
                    final_url: url.to_string(),
                    body: body.clone(),
                }),
                None => Err(anyhow::anyhow!("connection refused")),
            }
        }
    }

    fn record(url: &str) -> JobRecord {
        JobRecord {
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            salary: NOT_SPECIFIED.to_string(),
            job_type: NOT_SPECIFIED.to_string(),
            posted_date: String::new(),
            description_html: "<p>Short snippet…</p>".to_string(),
            description_text: "Short snippet…".to_string(),
            url: url.to_string(),
            scraped_at: Utc::now(),
        }
    }

    fn enricher<'a>(
        fetcher: &'a DetailPages,
        session: &'a SessionState,
        detector: &'a BlockDetector,
        batch: usize,
    ) -> DetailEnricher<'a> {
        DetailEnricher::new(
            fetcher,
            session,
            detector,
            &SiteProfile::default(),
            batch,
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn replaces_snippet_and_fills_job_type() {
        let fetcher = DetailPages::new(&[(
            "https://jobs.test/job/1",
            200,
            r#"<html><head><script type="application/ld+json">
                {"@type":"JobPosting","title":"Rust Engineer","employmentType":"FULL_TIME"}
            </script></head><body>
            <div class="job-description"><p>Full <b>description</b></p></div></body></html>"#,
        )]);
        let session = SessionState::default();
        let detector = BlockDetector::new(&SiteProfile::default());
        let mut records = vec![record("https://jobs.test/job/1")];

        let tally = enricher(&fetcher, &session, &detector, 5)
            .enrich(&mut records, &NoOpProgress)
            .await;

        assert_eq!(tally.succeeded, 1);
        assert_eq!(records[0].description_html, "<p>Full <b>description</b></p>");
        assert_eq!(records[0].description_text, "Full description");
        assert_eq!(records[0].job_type, "FULL_TIME");
    }

    #[tokio::test]
    async fn json_ld_description_used_without_markup_match() {
        let fetcher = DetailPages::new(&[(
            "https://jobs.test/job/2",
            200,
            r#"<script type="application/ld+json">
                {"@graph":[{"@type":"JobPosting","description":"<p>From <b>LD</b></p>"}]}
            </script>"#,
        )]);
        let session = SessionState::default();
        let detector = BlockDetector::new(&SiteProfile::default());
        let e = enricher(&fetcher, &session, &detector, 5);
        match e.fetch_detail("https://jobs.test/job/2").await {
            EnrichmentResult::Enriched {
                description_text, ..
            } => assert_eq!(description_text, "From LD"),
            other => panic!("expected enrichment, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blocked_detail_keeps_original_record() {
        let fetcher = DetailPages::new(&[
            (
                "https://jobs.test/job/1",
                200,
                "<html><head><title>Just a moment...</title></head></html>",
            ),
            ("https://jobs.test/job/2", 403, "denied"),
        ]);
        let session = SessionState::default();
        let detector = BlockDetector::new(&SiteProfile::default());
        let mut records = vec![record("https://jobs.test/job/1"), record("https://jobs.test/job/2")];
        let original = records.clone();

        let tally = enricher(&fetcher, &session, &detector, 5)
            .enrich(&mut records, &NoOpProgress)
            .await;

        assert_eq!(tally.blocked, 2);
        assert_eq!(records, original);
    }

    #[tokio::test]
    async fn failures_are_unavailable_and_order_is_kept() {
        let fetcher = DetailPages::new(&[
            (
                "https://jobs.test/job/2",
                200,
                r#"<div class="job-description">Two</div>"#,
            ),
            ("https://jobs.test/job/3", 404, "gone"),
        ]);
        let session = SessionState::default();
        let detector = BlockDetector::new(&SiteProfile::default());
        let mut records = vec![
            record("https://jobs.test/job/1"),
            record("https://jobs.test/job/2"),
            record(""),
            record("https://jobs.test/job/3"),
        ];

        let tally = enricher(&fetcher, &session, &detector, 2)
            .enrich(&mut records, &NoOpProgress)
            .await;

        assert_eq!(tally, EnrichmentTally { succeeded: 1, blocked: 0, failed: 2 });
        assert_eq!(records[0].description_text, "Short snippet…");
        assert_eq!(records[1].description_text, "Two");
        assert_eq!(records[2].url, "");
        assert_eq!(fetcher.requests.lock().expect("lock").len(), 3);
    }

    #[test]
    fn merge_keeps_existing_job_type() {
        let mut r = record("https://jobs.test/job/1");
        r.job_type = "Contract".to_string();
        DetailEnricher::merge(
            &mut r,
            EnrichmentResult::Enriched {
                description_html: "<p>x</p>".to_string(),
                description_text: "x".to_string(),
                job_type: Some("FULL_TIME".to_string()),
            },
        );
        assert_eq!(r.job_type, "Contract");
        assert_eq!(r.description_text, "x");
    }
}
