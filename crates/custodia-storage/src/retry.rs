//! Bounded-backoff retry for upstream storage calls.
//!
//! The object store being briefly unavailable must not fail a presign or
//! confirm outright, but the retry budget is bounded: after it is exhausted
//! the error escalates to the caller and the pending ledger record stays in
//! place for the orphan sweep.

use std::future::Future;
use std::time::Duration;

use crate::traits::StorageResult;

/// Retry budget and backoff base for storage operations.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Minimum 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each subsequent retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    fn delay_for(&self, retry_index: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry_index)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(3, Duration::from_millis(200))
    }
}

/// Run a storage operation, retrying retryable failures with exponential
/// backoff. Terminal errors (NotFound, InvalidKey, ConfigError) and budget
/// exhaustion propagate to the caller.
pub async fn retry_with_backoff<T, F, Fut>(policy: RetryPolicy, mut op: F) -> StorageResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StorageResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    error = %err,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Storage operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StorageError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(quick_policy(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(StorageError::BackendError("503".to_string()))
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_escalates() {
        let calls = AtomicU32::new(0);
        let result: StorageResult<()> = retry_with_backoff(quick_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StorageError::BackendError("503".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_errors_do_not_retry() {
        let calls = AtomicU32::new(0);
        let result: StorageResult<()> = retry_with_backoff(quick_policy(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StorageError::NotFound("k".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
