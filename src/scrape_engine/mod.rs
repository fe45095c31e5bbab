//! Scrape Engine Module
//!
//! Retrieval orchestration: HTTP-first and browser modes, pagination,
//! deduplication, enrichment, statistics and diagnostics.

// Sub-modules
pub mod browser_mode;
pub mod diagnostics;
pub mod enrichment;
pub mod errors;
pub mod execution;
pub mod http_mode;
pub mod orchestrator;
pub mod page_timeout;
pub mod pagination;
pub mod progress;
pub mod state;
pub mod stats;

// Re-exports for public API
pub use execution::{scrape_impl, scrape_with_progress};
pub use orchestrator::{StopReason, run_scrape};
pub use progress::{LogProgress, NoOpProgress, ProgressReporter};

pub use enrichment::{DetailEnricher, EnrichmentResult, EnrichmentTally};
pub use errors::{FailureKind, ScrapeError, ScrapeResult};
pub use pagination::{NextPage, NextPageProbe, PageCursor};
pub use state::{Deduplicator, SearchState};
pub use stats::{RetrievalMode, RunStatistics, RunSummary};
