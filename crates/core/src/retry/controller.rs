//! Bounded retry loop around a session call.

use std::future::Future;

use tracing::{debug, error, warn};

use crate::session::SessionError;

use super::types::{RetryOutcome, RetryPolicy, RetryState};

/// Drives one fallible call until it yields an acceptable value or the
/// attempt budget runs out.
///
/// Errors and unacceptable values are both retry triggers. The controller
/// sleeps between attempts but never after the last one, and never writes
/// output itself.
#[derive(Debug, Clone, Copy)]
pub struct RetryController {
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Retry `op` until `accept` returns true for its value.
    pub async fn resolve_with<T, F, Fut, A>(
        &self,
        label: &str,
        mut op: F,
        accept: A,
    ) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SessionError>>,
        A: Fn(&T) -> bool,
    {
        let mut state = RetryState::new(self.policy.max_attempts);

        while state.has_budget() {
            let attempt = state.begin_attempt();
            debug!(query = label, attempt, max = state.max_attempts(), "Attempt started");

            match op().await {
                Ok(value) if accept(&value) => {
                    state.record_success();
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt,
                    };
                }
                Ok(_) => {
                    warn!(
                        "Attempt {}/{} for '{}' returned no acceptable result",
                        attempt,
                        state.max_attempts(),
                        label
                    );
                    state.record_failure(None);
                }
                Err(e) => {
                    // Timeouts and missing selectors are routine; anything
                    // else points at the connection or the site itself.
                    if e.is_page_failure() {
                        warn!(
                            "Attempt {}/{} for '{}' failed: {}",
                            attempt,
                            state.max_attempts(),
                            label,
                            e
                        );
                    } else {
                        error!(
                            "Attempt {}/{} for '{}' failed: {}",
                            attempt,
                            state.max_attempts(),
                            label,
                            e
                        );
                    }
                    state.record_failure(Some(e));
                }
            }

            if state.has_budget() {
                let delay = self.policy.backoff.delay();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        state.into_exhausted()
    }

    /// Retry until the call returns a non-empty list.
    pub async fn resolve_non_empty<T, F, Fut>(&self, label: &str, op: F) -> RetryOutcome<Vec<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<T>, SessionError>>,
    {
        self.resolve_with(label, op, |items: &Vec<T>| !items.is_empty())
            .await
    }

    /// Retry until the call completes without an error.
    pub async fn resolve_completed<T, F, Fut>(&self, label: &str, op: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SessionError>>,
    {
        self.resolve_with(label, op, |_: &T| true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::BackoffPolicy;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn controller(max_attempts: u32) -> RetryController {
        RetryController::new(RetryPolicy::new(max_attempts, BackoffPolicy::none()))
    }

    /// A call that fails `failures` times, then returns a one-item list.
    async fn flaky(calls: &AtomicU32, failures: u32) -> Result<Vec<u32>, SessionError> {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= failures {
            Err(SessionError::NavigationTimeout(format!("attempt {}", n)))
        } else {
            Ok(vec![n])
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_failures_within_budget() {
        let calls = AtomicU32::new(0);
        let outcome = controller(5)
            .resolve_non_empty("brand", || flaky(&calls, 3))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.attempts(), 4);
        assert_eq!(outcome.into_value(), Some(vec![4]));
    }

    #[tokio::test]
    async fn test_exhausts_after_exactly_max_attempts() {
        let calls = AtomicU32::new(0);
        let outcome = controller(3)
            .resolve_non_empty("brand", || flaky(&calls, 10))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match outcome {
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(
                    last_error.map(|e| e.to_string()),
                    Some("navigation timed out: attempt 3".to_string())
                );
            }
            RetryOutcome::Succeeded { .. } => panic!("expected exhaustion"),
        }
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried_too() {
        let calls = AtomicU32::new(0);
        let outcome = controller(2)
            .resolve_completed("page", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(SessionError::HttpStatus {
                    status: 503,
                    url: "https://shop.example/s?k=x".to_string(),
                })
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match outcome {
            RetryOutcome::Exhausted { last_error, .. } => {
                assert!(last_error.is_some_and(|e| !e.is_page_failure()));
            }
            RetryOutcome::Succeeded { .. } => panic!("expected exhaustion"),
        }
    }

    #[tokio::test]
    async fn test_success_on_last_allowed_attempt() {
        let calls = AtomicU32::new(0);
        let outcome = controller(3)
            .resolve_non_empty("brand", || flaky(&calls, 2))
            .await;
        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_results_trigger_retry() {
        let calls = AtomicU32::new(0);
        let outcome = controller(4)
            .resolve_non_empty("keyword", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<Vec<String>, SessionError>(Vec::new())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match outcome {
            RetryOutcome::Exhausted { last_error, .. } => assert!(last_error.is_none()),
            RetryOutcome::Succeeded { .. } => panic!("expected exhaustion"),
        }
    }

    #[tokio::test]
    async fn test_resolve_completed_accepts_any_value() {
        let calls = AtomicU32::new(0);
        let outcome = controller(10)
            .resolve_completed("detail", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<u8, SessionError>(0)
            })
            .await;
        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_predicate() {
        let calls = AtomicU32::new(0);
        let outcome = controller(5)
            .resolve_with(
                "asin",
                || async {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<String, SessionError>(if n < 2 { String::new() } else { "Acme".into() })
                },
                |brand: &String| !brand.is_empty(),
            )
            .await;
        assert_eq!(outcome.into_value().as_deref(), Some("Acme"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sleep_after_final_attempt() {
        let policy = RetryPolicy::new(
            3,
            BackoffPolicy::new(Duration::from_secs(10), Duration::ZERO),
        );
        let start = tokio::time::Instant::now();
        let outcome = RetryController::new(policy)
            .resolve_completed("slow", || async {
                Err::<(), SessionError>(SessionError::ConnectionFailed("down".into()))
            })
            .await;

        assert!(!outcome.is_success());
        // Two pauses between three attempts.
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }
}
