//! Bounded retry with exponential backoff.
//!
//! Transient upstream failures (timeouts, 429s, 5xxs, connection errors) are
//! retried up to a configured attempt count, doubling the delay between
//! attempts. Terminal errors are returned immediately; see
//! [`RetryClass`](crate::errors::RetryClass).

use std::future::Future;
use std::time::Duration;

use crate::errors::{DataError, RetryClass};

/// Retry configuration applied to every upstream call.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Must be at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based):
    /// `base_delay * 2^(attempt-1)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Runs `op` until it succeeds, returns a terminal error, or the attempt
    /// budget is exhausted.
    ///
    /// Exhaustion wraps the final error in
    /// [`DataError::RetriesExhausted`] so callers can distinguish
    /// "failed after retrying" from a single terminal failure.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, DataError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DataError>>,
    {
        self.run_with_sleep(op, tokio::time::sleep).await
    }

    /// As [`run`](Self::run), with the sleep injected so tests can observe
    /// backoff delays without waiting them out.
    pub async fn run_with_sleep<T, F, Fut, S, SFut>(
        &self,
        mut op: F,
        sleep: S,
    ) -> Result<T, DataError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DataError>>,
        S: Fn(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if e.retry_class() == RetryClass::Never {
                        return Err(e);
                    }
                    if attempt >= self.max_attempts {
                        return Err(DataError::RetriesExhausted {
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }
                    let delay = self.backoff_delay(attempt);
                    log::warn!(
                        "Attempt {}/{} failed ({}), retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    fn transient() -> DataError {
        DataError::Timeout {
            provider: "SUPERFORM".to_string(),
        }
    }

    #[test]
    fn test_backoff_delays_double() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_until_success() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        };
        let calls = AtomicUsize::new(0);
        let delays: Mutex<Vec<Duration>> = Mutex::new(vec![]);

        let result = policy
            .run_with_sleep(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err(transient())
                        } else {
                            Ok(42)
                        }
                    }
                },
                |d| {
                    delays.lock().unwrap().push(d);
                    std::future::ready(())
                },
            )
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *delays.lock().unwrap(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_wraps_last_error() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };
        let calls = AtomicUsize::new(0);

        let result: Result<i32, _> = policy
            .run_with_sleep(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(transient()) }
                },
                |_| std::future::ready(()),
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(DataError::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, DataError::Timeout { .. }));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_terminal_error_is_not_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicUsize::new(0);

        let result: Result<i32, _> = policy
            .run_with_sleep(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async {
                        Err(DataError::UpstreamClient {
                            provider: "SUPERFORM".to_string(),
                            status: 401,
                            message: "bad api key".to_string(),
                        })
                    }
                },
                |_| std::future::ready(()),
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(DataError::UpstreamClient { .. })));
    }
}
