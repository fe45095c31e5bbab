//! Shared configuration constants for jobscrape
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Hard upper bound for `maxJobs`
///
/// Larger values are clamped, not rejected. `0` still means unbounded.
pub const MAX_JOBS_CAP: usize = 10_000;

/// Hard upper bound for `maxPages`
///
/// Search result listings rarely expose more than a few dozen pages before
/// they start repeating, so anything above this is clamped.
pub const MAX_PAGES_CAP: usize = 30;

/// Default number of page visits running concurrently in browser mode
pub const DEFAULT_MAX_CONCURRENT_PAGES: usize = 3;

/// Upper bound for concurrent browser page visits
pub const MAX_CONCURRENT_PAGES_CAP: usize = 10;

/// Default size of one detail-page enrichment batch
pub const DEFAULT_ENRICHMENT_BATCH_SIZE: usize = 5;

/// Upper bound for enrichment batch size
pub const MAX_ENRICHMENT_BATCH_SIZE: usize = 20;

/// Default pause between enrichment batches (milliseconds)
///
/// Keeps detail fetches below the request rate that typically trips
/// rate-based blocking on the listing site.
pub const DEFAULT_ENRICHMENT_PAUSE_MS: u64 = 1500;

/// Default number of bypass rounds for a challenged browser page
pub const DEFAULT_BYPASS_ATTEMPTS: u32 = 3;

/// Upper bound for bypass rounds
pub const MAX_BYPASS_ATTEMPTS: u32 = 10;

/// Consecutive failed or blocked pages before the run gives up
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Default timeout for `page.goto()` (seconds)
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 45;

/// Default timeout for `page.wait_for_navigation()` (seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Default timeout for a lightweight HTTP request (milliseconds)
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Placeholder used for missing salary and job type
pub const NOT_SPECIFIED: &str = "Not specified";

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
///
/// Used for lightweight requests too, so HTTP-first fetches and the browser
/// present the same client to the site.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Accept-Language sent by both retrieval modes
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
