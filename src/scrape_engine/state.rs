//! Run-scoped search state
//!
//! Owned by the orchestrator's control task. Concurrent page visits hand
//! their results back to that task, which is the only writer.

use std::collections::HashSet;

use crate::extraction::{ExtractionMethod, JobRecord};

/// Run-wide seen-key set
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
    dropped: usize,
}

impl Deduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` the first time a record's identity key is offered
    pub fn admit(&mut self, record: &JobRecord) -> bool {
        if self.seen.insert(record.identity_key()) {
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    /// Keep only unseen records, preserving order
    pub fn filter(&mut self, records: Vec<JobRecord>) -> Vec<JobRecord> {
        records.into_iter().filter(|r| self.admit(r)).collect()
    }

    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// What admitting one page's records produced
#[derive(Debug, Default)]
pub struct Admission {
    /// New records, already cut to the remaining record budget
    pub records: Vec<JobRecord>,
    pub duplicates: usize,
    /// Unseen records left out because the budget ran out
    pub over_budget: usize,
}

#[derive(Debug)]
pub struct SearchState {
    job_limit: Option<usize>,
    page_limit: Option<usize>,
    pub pages_processed: usize,
    pub records_emitted: usize,
    pub consecutive_failures: u32,
    pub method: Option<ExtractionMethod>,
    dedup: Deduplicator,
}

impl SearchState {
    /// `None` limits are unbounded
    #[must_use]
    pub fn new(job_limit: Option<usize>, page_limit: Option<usize>) -> Self {
        Self {
            job_limit,
            page_limit,
            pages_processed: 0,
            records_emitted: 0,
            consecutive_failures: 0,
            method: None,
            dedup: Deduplicator::new(),
        }
    }

    /// Records still allowed, `None` when unbounded
    #[must_use]
    pub fn remaining_jobs(&self) -> Option<usize> {
        self.job_limit
            .map(|limit| limit.saturating_sub(self.records_emitted))
    }

    /// Pages still allowed, `None` when unbounded
    #[must_use]
    pub fn remaining_pages(&self) -> Option<usize> {
        self.page_limit
            .map(|limit| limit.saturating_sub(self.pages_processed))
    }

    #[must_use]
    pub fn jobs_exhausted(&self) -> bool {
        self.remaining_jobs() == Some(0)
    }

    #[must_use]
    pub fn pages_exhausted(&self) -> bool {
        self.remaining_pages() == Some(0)
    }

    /// Either budget is spent
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.jobs_exhausted() || self.pages_exhausted()
    }

    /// Deduplicate one page's records and cut them to the remaining budget
    ///
    /// Records cut by the budget are not marked as seen.
    pub fn admit_page(&mut self, records: Vec<JobRecord>) -> Admission {
        let mut admission = Admission::default();
        let mut room = self.remaining_jobs();

        for record in records {
            if room == Some(0) {
                if !self.dedup.seen.contains(&record.identity_key()) {
                    admission.over_budget += 1;
                }
                continue;
            }
            if self.dedup.admit(&record) {
                admission.records.push(record);
                room = room.map(|r| r - 1);
            } else {
                admission.duplicates += 1;
            }
        }

        self.records_emitted += admission.records.len();
        admission
    }

    pub fn page_processed(&mut self) {
        self.pages_processed += 1;
    }

    pub fn note_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Count a failed or blocked page, returning the current streak
    pub fn note_failure(&mut self) -> u32 {
        self.consecutive_failures += 1;
        self.consecutive_failures
    }

    #[must_use]
    pub fn duplicates_dropped(&self) -> usize {
        self.dedup.dropped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(title: &str, url: &str) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            salary: "Not specified".to_string(),
            job_type: "Not specified".to_string(),
            posted_date: String::new(),
            description_html: String::new(),
            description_text: String::new(),
            url: url.to_string(),
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn dedup_spans_the_whole_run() {
        let mut dedup = Deduplicator::new();
        let first = dedup.filter(vec![record("A", "https://x/1"), record("B", "https://x/2")]);
        let second = dedup.filter(vec![record("A again", "https://x/1"), record("C", "https://x/3")]);

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].title, "C");
        assert_eq!(dedup.dropped(), 1);
        assert_eq!(dedup.seen_count(), 3);
    }

    #[test]
    fn composite_key_used_without_url() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.admit(&record("Rust Engineer", "")));
        assert!(!dedup.admit(&record("rust engineer", "")));
        assert!(dedup.admit(&record("Go Engineer", "")));
    }

    #[test]
    fn admission_respects_job_budget() {
        let mut state = SearchState::new(Some(3), None);
        let first = state.admit_page(vec![record("A", "https://x/1"), record("B", "https://x/2")]);
        assert_eq!(first.records.len(), 2);

        let second = state.admit_page(vec![
            record("A", "https://x/1"),
            record("C", "https://x/3"),
            record("D", "https://x/4"),
        ]);
        assert_eq!(second.records.len(), 1);
        assert_eq!(second.duplicates, 1);
        assert_eq!(second.over_budget, 1);
        assert_eq!(state.records_emitted, 3);
        assert!(state.jobs_exhausted());
    }

    #[test]
    fn unbounded_limits_never_exhaust() {
        let mut state = SearchState::new(None, None);
        for _ in 0..100 {
            state.page_processed();
        }
        assert!(!state.budget_exhausted());
        assert_eq!(state.remaining_jobs(), None);
    }

    #[test]
    fn page_budget() {
        let mut state = SearchState::new(None, Some(2));
        state.page_processed();
        assert_eq!(state.remaining_pages(), Some(1));
        state.page_processed();
        assert!(state.pages_exhausted());
    }

    #[test]
    fn failure_streak_resets_on_success() {
        let mut state = SearchState::new(None, None);
        assert_eq!(state.note_failure(), 1);
        assert_eq!(state.note_failure(), 2);
        state.note_success();
        assert_eq!(state.note_failure(), 1);
    }
}
