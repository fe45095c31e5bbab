//! Output sinks
//!
//! A run writes three things: the record dataset (appended once per page or
//! enrichment batch), best-effort diagnostics keyed by name, and one summary
//! at the end.

pub mod fs;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::extraction::JobRecord;
use crate::scrape_engine::stats::RunSummary;

pub use fs::FsSink;
pub use memory::MemorySink;

/// Key under which the run summary is stored
pub const RUN_SUMMARY_KEY: &str = "RUN_SUMMARY.json";

#[async_trait]
pub trait JobSink: Send + Sync {
    /// Append records to the dataset, preserving order
    async fn push_records(&self, records: &[JobRecord]) -> Result<()>;

    /// Store a diagnostic blob (raw HTML, structure summary, screenshot)
    async fn save_diagnostic(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    async fn save_summary(&self, summary: &RunSummary) -> Result<()>;
}
