//! Timeout and cancellation wrapper for processor operations
//!
//! Races an operation against a timer and a cancellation token.
//! Exceeding the timer fails the operation; the underlying future is
//! dropped (best-effort cancellation only).

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, Result};

/// Run `operation` with a time budget and a cancellation token.
pub async fn run_with_timeout<F, T>(
    timeout_ms: u64,
    token: &CancellationToken,
    operation: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        _ = token.cancelled() => Err(EngineError::Cancelled),
        _ = tokio::time::sleep(Duration::from_millis(timeout_ms)) => {
            Err(EngineError::Timeout(timeout_ms))
        }
        result = operation => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_budget() {
        let token = CancellationToken::new();
        let result = run_with_timeout(1_000, &token, async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_times_out() {
        let token = CancellationToken::new();
        let result: Result<()> = run_with_timeout(10, &token, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(EngineError::Timeout(10))));
    }

    #[tokio::test]
    async fn test_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<()> = run_with_timeout(1_000, &token, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }
}
