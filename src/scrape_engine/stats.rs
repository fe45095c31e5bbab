//! Run statistics
//!
//! `RunStatistics` is owned by the orchestrator and mutated only from its
//! control task. `RunSummary` is the serializable snapshot persisted once at
//! the end of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use crate::extraction::ExtractionMethod;

/// How a listing page was retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    Http,
    Browser,
}

impl RetrievalMode {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Browser => "browser",
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug)]
pub struct RunStatistics {
    started_at: DateTime<Utc>,
    started: Instant,
    /// Listing pages of the final pagination pass
    pub pages_processed: usize,
    /// Listing pages retrieved over HTTP, including a pass the browser restarted
    pub http_pages: usize,
    pub records_emitted: usize,
    /// Candidates the normalizer dropped for lacking both title and URL
    pub candidates_discarded: usize,
    pub duplicates_dropped: usize,
    pub http_blocks: usize,
    pub browser_blocked_pages: usize,
    pub bypass_rounds: u32,
    pub failed_pages: usize,
    pub enrichment_succeeded: usize,
    pub enrichment_blocked: usize,
    pub enrichment_failed: usize,
    /// Pages that produced candidates, per strategy
    strategy_pages: BTreeMap<ExtractionMethod, usize>,
    final_method: Option<ExtractionMethod>,
    modes: Vec<RetrievalMode>,
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            pages_processed: 0,
            http_pages: 0,
            records_emitted: 0,
            candidates_discarded: 0,
            duplicates_dropped: 0,
            http_blocks: 0,
            browser_blocked_pages: 0,
            bypass_rounds: 0,
            failed_pages: 0,
            enrichment_succeeded: 0,
            enrichment_blocked: 0,
            enrichment_failed: 0,
            strategy_pages: BTreeMap::new(),
            final_method: None,
            modes: Vec::new(),
        }
    }

    /// Count a page whose candidates came from `method`
    ///
    /// The most recent successful strategy is the one reported as final.
    pub fn record_strategy(&mut self, method: ExtractionMethod) {
        *self.strategy_pages.entry(method).or_insert(0) += 1;
        self.final_method = Some(method);
    }

    /// Note that a retrieval mode was used; each mode is listed once, in first-use order
    pub fn record_mode(&mut self, mode: RetrievalMode) {
        if !self.modes.contains(&mode) {
            self.modes.push(mode);
        }
    }

    #[must_use]
    pub fn final_method(&self) -> Option<ExtractionMethod> {
        self.final_method
    }

    #[must_use]
    pub fn strategy_pages(&self, method: ExtractionMethod) -> usize {
        self.strategy_pages.get(&method).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn modes(&self) -> &[RetrievalMode] {
        &self.modes
    }

    /// Snapshot for persistence
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            records_emitted: self.records_emitted,
            pages_processed: self.pages_processed,
            http_pages: self.http_pages,
            extraction_method: self.final_method,
            retrieval_modes: self.modes.clone(),
            candidates_discarded: self.candidates_discarded,
            duplicates_dropped: self.duplicates_dropped,
            http_blocks: self.http_blocks,
            browser_blocked_pages: self.browser_blocked_pages,
            bypass_rounds: self.bypass_rounds,
            failed_pages: self.failed_pages,
            enrichment_succeeded: self.enrichment_succeeded,
            enrichment_blocked: self.enrichment_blocked,
            enrichment_failed: self.enrichment_failed,
            strategy_pages: self
                .strategy_pages
                .iter()
                .map(|(method, count)| (method.label().to_string(), *count))
                .collect(),
            started_at: self.started_at,
            duration_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Final report of a run, persisted as `RUN_SUMMARY.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub records_emitted: usize,
    pub pages_processed: usize,
    pub http_pages: usize,
    /// Strategy that produced the last successful page
    pub extraction_method: Option<ExtractionMethod>,
    pub retrieval_modes: Vec<RetrievalMode>,
    pub candidates_discarded: usize,
    pub duplicates_dropped: usize,
    pub http_blocks: usize,
    pub browser_blocked_pages: usize,
    pub bypass_rounds: u32,
    pub failed_pages: usize,
    pub enrichment_succeeded: usize,
    pub enrichment_blocked: usize,
    pub enrichment_failed: usize,
    pub strategy_pages: BTreeMap<String, usize>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_method_tracks_latest_success() {
        let mut stats = RunStatistics::new();
        stats.record_strategy(ExtractionMethod::Hydration);
        stats.record_strategy(ExtractionMethod::Hydration);
        stats.record_strategy(ExtractionMethod::Intercepted);

        assert_eq!(stats.final_method(), Some(ExtractionMethod::Intercepted));
        assert_eq!(stats.strategy_pages(ExtractionMethod::Hydration), 2);
        assert_eq!(stats.strategy_pages(ExtractionMethod::Dom), 0);
    }

    #[test]
    fn modes_listed_once_in_first_use_order() {
        let mut stats = RunStatistics::new();
        stats.record_mode(RetrievalMode::Http);
        stats.record_mode(RetrievalMode::Browser);
        stats.record_mode(RetrievalMode::Http);
        assert_eq!(stats.modes(), &[RetrievalMode::Http, RetrievalMode::Browser]);
    }

    #[test]
    fn summary_serializes_camel_case() {
        let mut stats = RunStatistics::new();
        stats.records_emitted = 7;
        stats.record_strategy(ExtractionMethod::JsonLd);
        stats.record_mode(RetrievalMode::Http);

        let json = serde_json::to_value(stats.summary()).expect("serialize");
        assert_eq!(json["recordsEmitted"], 7);
        assert_eq!(json["extractionMethod"], "json_ld");
        assert_eq!(json["retrievalModes"][0], "http");
        assert_eq!(json["strategyPages"]["json_ld"], 1);
        assert!(json["durationMs"].is_u64());
    }
}
