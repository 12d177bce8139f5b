use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{GoproxyError, Result};

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(60);

/// Fixed-interval polling bounded by an overall timeout.
///
/// The first attempt runs immediately. Transient failures
/// ([`GoproxyError::is_transient`]) are retried every `interval` until
/// `timeout` has elapsed; anything else ends the loop right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            timeout: DEFAULT_RETRY_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Run `operation` until it succeeds, fails terminally, the deadline
    /// passes, or `cancel` fires.
    ///
    /// `url` and `module` only label the timeout and cancellation errors.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        url: &str,
        module: &str,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let cancelled = || GoproxyError::Cancelled {
            module: module.to_string(),
        };
        let mut last: Option<GoproxyError> = None;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(url, attempt, "requesting goproxy");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                outcome = timeout_at(deadline, operation()) => outcome,
            };

            match outcome {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) if err.is_transient() => {
                    warn!(url, attempt, error = %err, "transient goproxy failure");
                    last = Some(err);
                }
                Ok(Err(err)) => return Err(err),
                // The attempt itself ran past the deadline.
                Err(_) => break,
            }

            if Instant::now() + self.interval > deadline {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = sleep(self.interval) => {}
            }
        }

        Err(GoproxyError::FetchTimeout {
            url: url.to_string(),
            elapsed: start.elapsed(),
            last: last.map(Box::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::StatusCode;

    use super::*;

    const URL: &str = "http://127.0.0.1:1/m/@v/list";

    fn fast() -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(20), Duration::from_millis(200))
    }

    fn unavailable() -> GoproxyError {
        GoproxyError::Status {
            url: URL.to_string(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(10));
        assert_eq!(policy.timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn first_success_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let value = fast()
            .run(&CancellationToken::new(), URL, "m", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, GoproxyError>(42)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let value = fast()
            .run(&CancellationToken::new(), URL, "m", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(unavailable())
                    } else {
                        Ok::<_, GoproxyError>("ok")
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn terminal_failure_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let err = fast()
            .run(&CancellationToken::new(), URL, "m", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(GoproxyError::NotFound {
                        module: "m".to_string(),
                    })
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GoproxyError::NotFound { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn persistent_failure_times_out_with_last_error() {
        let err = fast()
            .run(&CancellationToken::new(), URL, "m", || async {
                Err::<(), _>(unavailable())
            })
            .await
            .unwrap_err();

        match err {
            GoproxyError::FetchTimeout { url, last, .. } => {
                assert_eq!(url, URL);
                assert!(matches!(
                    last.as_deref(),
                    Some(GoproxyError::Status { .. })
                ));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn hanging_attempt_is_cut_off_at_deadline() {
        let err = fast()
            .run(&CancellationToken::new(), URL, "m", || async {
                sleep(Duration::from_secs(30)).await;
                Ok::<_, GoproxyError>(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GoproxyError::FetchTimeout { last: None, .. }));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let err = fast()
            .run(&cancel, URL, "m", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, GoproxyError>(())
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GoproxyError::Cancelled { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_retry_sleep() {
        let policy = RetryPolicy::new(Duration::from_secs(5), Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = policy
            .run(&cancel, URL, "m", || async { Err::<(), _>(unavailable()) })
            .await
            .unwrap_err();

        assert!(matches!(err, GoproxyError::Cancelled { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
