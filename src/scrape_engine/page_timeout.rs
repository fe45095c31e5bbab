//! Timeout utilities for page operations
//!
//! Provides async timeout wrappers to prevent indefinite hangs during
//! page navigation, loading, and other browser operations.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Helper function to wrap async page operations with explicit timeout
///
/// Returns proper error messages distinguishing between timeout and operation failures.
/// The message contains "timeout" so `FailureKind::classify` labels it correctly.
///
/// # Arguments
/// * `operation` - The async Future to execute with a timeout
/// * `timeout_secs` - Timeout duration in seconds
/// * `operation_name` - Human-readable name for error messages
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout_secs: u64,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {timeout_secs} seconds"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape_engine::errors::FailureKind;

    #[tokio::test(start_paused = true)]
    async fn slow_operation_times_out() {
        let err = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
            1,
            "Page load",
        )
        .await
        .expect_err("timeout");
        assert_eq!(err.to_string(), "Page load timeout after 1 seconds");
        assert_eq!(FailureKind::classify(&err), FailureKind::Timeout);
    }

    #[tokio::test]
    async fn inner_error_passes_through() {
        let err = with_page_timeout(async { Err::<(), _>(anyhow::anyhow!("boom")) }, 5, "Navigation")
            .await
            .expect_err("inner error");
        assert_eq!(err.to_string(), "boom");
    }
}
