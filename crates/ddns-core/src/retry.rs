//! Bounded exponential-backoff retry
//!
//! Every outbound call goes through [`retry`]. Only transient failures
//! (HTTP status >= 429, and transport errors when enabled) are retried;
//! everything else is returned to the caller on the first attempt.
//!
//! With the default policy a persistently failing call is attempted six
//! times, sleeping 100ms, 200ms, 400ms, 800ms and 1600ms in between.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default number of retries after the initial attempt
pub const DEFAULT_MAX_RETRIES: usize = 5;

/// Default delay before the first retry
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Default upper bound for a single backoff delay
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry policy for outbound calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries (0 disables retrying)
    pub max_retries: usize,

    /// Delay before the first retry; doubled for every retry after it
    pub initial_backoff: Duration,

    /// Upper bound for a single delay
    pub max_backoff: Duration,

    /// Also retry transport failures (connect errors, timeouts)
    pub retry_transport_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            retry_transport_errors: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the initial backoff
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Set the backoff cap
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Enable or disable retrying transport failures
    pub fn with_transport_retries(mut self, enabled: bool) -> Self {
        self.retry_transport_errors = enabled;
        self
    }

    /// Delay before retry number `retry` (zero-based)
    pub fn backoff_for(&self, retry: usize) -> Duration {
        let factor = 2u32.checked_pow(retry as u32).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Whether `err` qualifies for another attempt under this policy
    pub fn should_retry(&self, err: &Error) -> bool {
        err.is_transient() || (self.retry_transport_errors && err.is_transport())
    }
}

/// Run `op` under `policy`
///
/// `operation` labels log lines and the [`Error::RetriesExhausted`] returned
/// once the retry budget is spent.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if policy.should_retry(&err) => {
                if retries >= policy.max_retries {
                    if policy.max_retries == 0 {
                        return Err(err);
                    }
                    return Err(Error::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: retries + 1,
                        source: Box::new(err),
                    });
                }

                let delay = policy.backoff_for(retries);
                retries += 1;
                warn!(
                    operation,
                    retry = retries,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure: {}",
                    err
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
