//! Error types for scrape operations
//!
//! `ScrapeError` is the public error of a run. Internal plumbing works in
//! `anyhow::Result` and converts at the boundary, the same way crawl errors
//! are handled elsewhere in the engine.

use thiserror::Error;

/// Convenience alias for Result with `ScrapeError`
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Errors that abort a run or a retrieval step
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Input failed validation. Fatal, raised before any fetch.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Browser could not be launched or driven
    #[error("Browser error: {0}")]
    Browser(String),

    /// Lightweight request failed at the transport level
    #[error("Network error: {0}")]
    Network(String),

    /// The output sink rejected a write
    #[error("Sink error: {0}")]
    Sink(String),

    /// Other errors
    #[error("Scrape error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for ScrapeError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        Self::Other(format!("{err:#}"))
    }
}

impl ScrapeError {
    /// Whether the error must stop the run before anything is fetched
    #[must_use]
    pub fn is_fatal_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Categorizes page failures for logging and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, DNS, connection refused
    Network,
    /// Page navigation or load exceeded its deadline
    Timeout,
    /// Browser/CDP failure
    Browser,
    /// Unknown/unclassified error
    Unknown,
}

impl FailureKind {
    /// Classify an error into a failure kind based on error message patterns
    #[must_use]
    pub fn classify(error: &anyhow::Error) -> Self {
        let msg = format!("{error:#}").to_lowercase();

        if msg.contains("timeout") || msg.contains("timed out") {
            return Self::Timeout;
        }

        if msg.contains("connection refused")
            || msg.contains("connection reset")
            || msg.contains("dns")
            || msg.contains("network")
            || msg.contains("unreachable")
            || msg.contains("eof")
        {
            return Self::Network;
        }

        if msg.contains("browser")
            || msg.contains("chrome")
            || msg.contains("cdp")
            || msg.contains("target")
            || msg.contains("session")
        {
            return Self::Browser;
        }

        Self::Unknown
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Browser => "browser",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_timeouts_before_network() {
        let err = anyhow::anyhow!("Page navigation timeout after 30 seconds");
        assert_eq!(FailureKind::classify(&err), FailureKind::Timeout);
    }

    #[test]
    fn classifies_context_chain() {
        let err = anyhow::anyhow!("connection reset by peer").context("Failed to fetch page");
        assert_eq!(FailureKind::classify(&err), FailureKind::Network);
    }

    #[test]
    fn anyhow_conversion_keeps_chain() {
        let err: ScrapeError = anyhow::anyhow!("inner").context("outer").into();
        assert_eq!(err.to_string(), "Scrape error: outer: inner");
    }
}
