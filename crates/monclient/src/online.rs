//! Waiting for the cluster to come online
//!
//! A plain polling loop: attempt, and on failure log and sleep a fixed
//! interval, until an attempt succeeds or the time budget is spent. Elapsed
//! time is only checked between attempts, so a slow attempt is never cut
//! short.

use crate::error::{MonClientError, Result};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Default maximum wait (one hour)
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Default pause between attempts (one minute)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    timeout: Duration,
    interval: Duration,
}

impl WaitOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(MonClientError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self { timeout, interval })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Run `attempt` until it succeeds or `wait.timeout()` has elapsed.
///
/// Every error is retried. The last sleep is shortened to the remaining
/// budget, so the timeout error is returned once the full budget has passed
/// and never before.
pub async fn poll_until_ok<T, E, F, Fut>(
    description: &str,
    wait: &WaitOptions,
    mut attempt: F,
) -> Result<T>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;
    let mut last_error = None;

    while start.elapsed() < wait.timeout {
        attempts += 1;
        match attempt().await {
            Ok(value) => {
                info!(attempts, "{} is online", description);
                return Ok(value);
            }
            Err(e) => {
                warn!(attempt = attempts, error = %e, "cannot reach {}, retrying", description);
                last_error = Some(e.to_string());
            }
        }

        let remaining = wait.timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            break;
        }
        tokio::time::sleep(wait.interval.min(remaining)).await;
    }

    Err(MonClientError::Timeout {
        timeout: wait.timeout,
        attempts,
        last_error,
    })
}
