//! Retry envelope for GenAI calls (spec §4.1). Grounded on the journal-client
//! `Retry` trait: callers classify an error as retryable or terminal, and the
//! backoff schedule decides how long to wait between attempts.

use std::time::Duration;

use exponential_backoff::Backoff;

/// Whether a failed attempt should be retried, and which counter (if any)
/// to increment when it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryability {
    Retry,
    Terminal,
}

pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial: Duration, max: Duration) -> Self {
        let backoff = Backoff::new(max_attempts, initial, Some(max));
        Self {
            max_attempts,
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff duration before attempt number `attempt` (1-indexed, the
    /// attempt that just failed). Returns `None` once attempts are exhausted.
    pub fn wait_before_retry(&self, attempt: u32) -> Option<Duration> {
        self.backoff.next(attempt)
    }
}

/// Runs `op` under the retry policy, calling `classify` on each error to
/// decide whether to retry, and `on_retry` once per retry (the caller wires
/// this to the `retries_classify`/`retries_extract` metrics).
pub async fn with_retry<T, E, Op, Fut, Classify, OnRetry>(
    policy: &RetryPolicy,
    mut op: Op,
    classify: Classify,
    mut on_retry: OnRetry,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    Classify: Fn(&E) -> Retryability,
    OnRetry: FnMut(),
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts() || classify(&err) == Retryability::Terminal {
                    return Err(err);
                }
                let Some(wait) = policy.wait_before_retry(attempt) else {
                    return Err(err);
                };
                on_retry();
                tokio::time::sleep(wait).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success_within_max_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5));
        let attempts = AtomicU32::new(0);
        let retries_seen = AtomicU32::new(0);

        let result: Result<&str, &str> = with_retry(
            &policy,
            || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("transient")
                } else {
                    Ok("ok")
                }
            },
            |_| Retryability::Retry,
            || {
                retries_seen.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(retries_seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn terminal_error_is_not_retried() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5));
        let attempts = AtomicU32::new(0);

        let result: Result<&str, &str> = with_retry(
            &policy,
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err("malformed")
            },
            |_| Retryability::Terminal,
            || panic!("should not retry a terminal error"),
        )
        .await;

        assert_eq!(result, Err("malformed"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausting_attempts_surfaces_last_error() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(5));
        let attempts = AtomicU32::new(0);

        let result: Result<&str, &str> = with_retry(
            &policy,
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err("still failing")
            },
            |_| Retryability::Retry,
            || {},
        )
        .await;

        assert_eq!(result, Err("still failing"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
