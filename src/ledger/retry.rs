// src/ledger/retry.rs
//! Exponential-backoff retry policy.
//!
//! One policy object owns the backoff schedule for every retriable call
//! site; callers pass the operation as a closure and get back either its
//! result or the last error together with the attempt count.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Outcome of an exhausted retry budget: how many attempts ran and the
/// error the final one produced.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Retry schedule: an initial attempt plus up to `max_retries` retries,
/// sleeping `base_delay * 2^n` before retry `n`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_retries,
            base_delay,
        }
    }

    /// Runs `f` until it succeeds or the budget is spent.
    ///
    /// The closure is invoked up to `max_retries + 1` times. Each failed
    /// attempt is logged at warn level with the delay before the next one.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, f: F) -> Result<T, RetryExhausted<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if attempts <= self.max_retries => {
                    let delay = self.base_delay * 2u32.saturating_pow(attempts - 1);
                    log::warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        operation,
                        attempts,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(RetryExhausted {
                        attempts,
                        last_error: e,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1))
    }

    #[test]
    fn test_succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result = tokio_test::block_on(policy().run("op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>(42) }
        }));

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = policy()
            .run("op", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("down".to_string())
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts_and_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = policy()
            .run("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("refused".to_string()) }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last_error, "refused");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
