//! Retry with exponential backoff
//!
//! Generic wrapper around a fallible async operation. The wrapper is
//! error-kind-agnostic: the same code path serves network fetches and
//! datastore upserts, gated only by [`IngestError::is_retryable`].

use crate::error::IngestError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded exponential backoff parameters
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each retry after that
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Invoke `operation` up to `policy.max_attempts` times.
///
/// Returns the first success immediately. A non-retryable error, or a
/// failure on the final attempt, propagates as-is. Between retryable
/// failures the task sleeps `base_delay * 2^(attempt-1)` with no jitter,
/// so the default policy waits 1000ms then 2000ms.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, IngestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IngestError>>,
{
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt >= policy.max_attempts {
                    return Err(err);
                }

                let delay = policy.base_delay * 2u32.pow(attempt - 1);
                warn!(
                    operation = label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    retry_delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
