//! Bounded polling of long-running platform resources.

use core::future::Future;
use core::time::Duration;

use backon::{ConstantBuilder, Retryable};
use tracing::debug;

use crate::error::{MonitorError, Result};

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: usize,
}

impl PollPolicy {
    /// Endpoint creation usually takes several minutes.
    pub const ENDPOINT: Self = Self {
        interval: Duration::from_secs(30),
        max_attempts: 60,
    };

    /// Baselining and monitoring jobs.
    pub const PROCESSING_JOB: Self = Self {
        interval: Duration::from_secs(30),
        max_attempts: 120,
    };

    /// Capture files appear a few minutes after the requests.
    pub const CAPTURE: Self = Self {
        interval: Duration::from_secs(30),
        max_attempts: 20,
    };

    /// Polls without waiting, for tests and local stores.
    #[must_use]
    pub const fn immediate(max_attempts: usize) -> Self {
        Self {
            interval: Duration::ZERO,
            max_attempts,
        }
    }
}

/// Outcome of one poll.
#[derive(Debug)]
pub enum PollStatus<T> {
    Ready(T),
    Pending(String),
}

enum PollError {
    Pending(String),
    Fatal(MonitorError),
}

/// Calls `check` until it reports [`PollStatus::Ready`], fails, or the
/// policy runs out.
///
/// # Errors
///
/// Returns the first error `check` produces, or `Timeout` naming `what`.
pub async fn poll_until<T, F, Fut>(policy: PollPolicy, what: &str, mut check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>>>,
{
    let attempt = || {
        let fut = check();
        async move {
            match fut.await {
                Ok(PollStatus::Ready(value)) => Ok(value),
                Ok(PollStatus::Pending(status)) => Err(PollError::Pending(status)),
                Err(e) => Err(PollError::Fatal(e)),
            }
        }
    };

    let backoff = ConstantBuilder::default()
        .with_delay(policy.interval)
        .with_max_times(policy.max_attempts.saturating_sub(1));

    attempt
        .retry(backoff)
        .when(|e| matches!(e, PollError::Pending(_)))
        .notify(|e, delay| {
            if let PollError::Pending(status) = e {
                debug!(what, status = %status, ?delay, "Still waiting");
            }
        })
        .await
        .map_err(|e| match e {
            PollError::Pending(status) => {
                MonitorError::Timeout(format!("{what} (last status {status})"))
            }
            PollError::Fatal(e) => e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_after_pending() {
        let mut calls = 0;
        let value = poll_until(PollPolicy::immediate(5), "job", || {
            calls += 1;
            let status = if calls < 3 {
                PollStatus::Pending("InProgress".to_string())
            } else {
                PollStatus::Ready(calls)
            };
            async move { Ok(status) }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = poll_until::<(), _, _>(PollPolicy::immediate(2), "endpoint", || async {
            Ok(PollStatus::Pending("Creating".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, MonitorError::Timeout(ref what) if what.contains("Creating")));
    }

    #[tokio::test]
    async fn test_fatal_error_stops_polling() {
        let mut calls = 0;
        let err = poll_until::<(), _, _>(PollPolicy::immediate(5), "job", || {
            calls += 1;
            async { Err(MonitorError::NotFound("job".to_string())) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, MonitorError::NotFound(_)));
        assert_eq!(calls, 1);
    }
}
