//! Bounded retry loop used for page navigation.
//!
//! The orchestrator retries navigation a fixed number of times before it
//! skips the target. Every wait between attempts is cancellable so a
//! supervisor can stop a stuck session without waiting out the backoff.
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Zero is treated as one.
    pub max_attempts: usize,
    /// Delay before the second attempt; doubled after each failure.
    pub initial_backoff_ms: u64,
    /// Upper bound for a single delay.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given (1-based) failed attempt.
    ///
    /// ```
    /// use hawk_common::retry::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy { max_attempts: 5, initial_backoff_ms: 100, max_backoff_ms: 250 };
    /// assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
    /// assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
    /// assert_eq!(policy.backoff_for(3), Duration::from_millis(250));
    /// ```
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }
}

/// Why a retried operation gave up.
#[derive(thiserror::Error, Debug)]
pub enum RetryError<E: std::fmt::Display + std::fmt::Debug> {
    /// Every attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: usize, last: E },

    /// The operation failed with an error the caller does not retry.
    #[error("{0}")]
    Rejected(E),

    /// The cancellation token fired before the operation succeeded.
    #[error("retry cancelled")]
    Cancelled,
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempt budget is spent.
pub async fn retry_bounded<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    is_retryable: R,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: std::fmt::Display + std::fmt::Debug,
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1usize;
    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retryable(&err) => return Err(RetryError::Rejected(err)),
            Err(err) if attempt >= max_attempts => {
                tracing::warn!(
                    target: "retry",
                    attempt,
                    max_attempts,
                    error = %err,
                    "giving up"
                );
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }
            Err(err) => {
                let delay = policy.backoff_for(attempt);
                tracing::warn!(
                    target: "retry",
                    attempt,
                    max_attempts,
                    backoff_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let result: Result<&str, RetryError<String>> = retry_bounded(
            &fast_policy(3),
            &CancellationToken::new(),
            |_| true,
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(format!("timeout on attempt {attempt}"))
                    } else {
                        Ok("loaded")
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), "loaded");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_at_attempt_budget() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), RetryError<String>> = retry_bounded(
            &fast_policy(2),
            &CancellationToken::new(),
            |_| true,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("unreachable host".to_string()) }
            },
        )
        .await;

        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last, "unreachable host");
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_retryable_errors_return_immediately() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), RetryError<String>> = retry_bounded(
            &fast_policy(5),
            &CancellationToken::new(),
            |err: &String| err != "fatal",
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("fatal".to_string()) }
            },
        )
        .await;

        assert!(matches!(result, Err(RetryError::Rejected(ref e)) if e == "fatal"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), RetryError<String>> =
            retry_bounded(&fast_policy(3), &cancel, |_| true, |_| async { Ok(()) }).await;
        assert!(matches!(result, Err(RetryError::Cancelled)));
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        assert_eq!(fast_policy(0).attempts(), 1);
    }
}
