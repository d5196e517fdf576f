//! Retrying HTTP helpers.
//!
//! Upstream platform APIs fail transiently often enough (TLS resets,
//! half-open connections, truncated chunked bodies) that every outbound
//! call goes through a bounded retry with a fixed inter-attempt delay.
//! Anything that is not a transient network class is surfaced immediately.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use tracing::warn;

use crate::error::ExtractorError;

pub const DEFAULT_RETRIES: usize = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Classification hook for [`with_retry`].
pub trait Retryable {
    /// Whether the failure belongs to the transient allow-list
    /// (timeouts, connect/TLS failures, truncated transfers).
    fn is_transient(&self) -> bool;
}

impl Retryable for reqwest::Error {
    fn is_transient(&self) -> bool {
        self.is_timeout() || self.is_connect() || self.is_body() || self.is_decode()
    }
}

impl Retryable for ExtractorError {
    fn is_transient(&self) -> bool {
        match self {
            ExtractorError::UpstreamRequestFailed(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Run `op` up to `retries` times, sleeping `delay` between transient
/// failures. Non-transient errors abort immediately; after the attempts
/// are exhausted the last transient error is returned.
pub async fn with_retry<T, E, F, Fut>(retries: usize, delay: Duration, mut op: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let retries = retries.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < retries => {
                warn!(attempt, retries, error = %e, "transient failure, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Send a request with the default retry policy.
///
/// The builder must be cloneable (no streaming body), which holds for
/// every request the extractors issue.
pub async fn send_with_retry(
    builder: RequestBuilder,
    retries: usize,
    delay: Duration,
) -> Result<Response, ExtractorError> {
    with_retry(retries, delay, || {
        let req = builder.try_clone();
        async move {
            match req {
                Some(req) => req.send().await.map_err(ExtractorError::from),
                None => Err(ExtractorError::Other(
                    "request body is not cloneable".to_string(),
                )),
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[derive(Debug)]
    enum TestError {
        Timeout,
        Fatal,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                TestError::Timeout => write!(f, "timeout"),
                TestError::Fatal => write!(f, "fatal"),
            }
        }
    }

    impl Retryable for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Timeout)
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_with_delay() {
        let attempts = AtomicUsize::new(0);
        let delay = Duration::from_millis(50);
        let start = Instant::now();

        let result: Result<u32, TestError> = with_retry(3, delay, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TestError::Timeout)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= delay * 2);
    }

    #[tokio::test]
    async fn fatal_failures_abort_immediately() {
        let attempts = AtomicUsize::new(0);

        let result: Result<u32, TestError> = with_retry(3, Duration::from_millis(10), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Fatal) }
        })
        .await;

        assert!(matches!(result, Err(TestError::Fatal)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_transient_error() {
        let attempts = AtomicUsize::new(0);

        let result: Result<u32, TestError> = with_retry(3, Duration::from_millis(1), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Timeout) }
        })
        .await;

        assert!(matches!(result, Err(TestError::Timeout)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
