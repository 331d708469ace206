//! Exponential back-off for fallible async operations
//!
//! Shared by the uploader (part and finalize calls) and the prediction poller.

use crate::error::PixelbinError;
use std::future::Future;
use std::time::Duration;

/// Retry budget and delay curve
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `retries + 1`
    pub retries: u32,
    /// Multiplier applied to the delay after every retry
    pub factor: f64,
    /// Delay before the first retry
    pub min_timeout: Duration,
    /// Upper bound on any single delay
    pub max_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 10,
            factor: 2.0,
            min_timeout: Duration::from_millis(1000),
            max_timeout: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            ..Default::default()
        }
    }

    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn min_timeout(mut self, timeout: Duration) -> Self {
        self.min_timeout = timeout;
        self
    }

    pub fn max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    /// Delay before retry `n` (0-based): `min_timeout * factor^n`, capped
    pub fn delay_for(&self, n: u32) -> Duration {
        let exponent = i32::try_from(n).unwrap_or(i32::MAX);
        let millis = self.min_timeout.as_millis() as f64 * self.factor.powi(exponent);
        let cap = self.max_timeout.as_millis() as f64;
        if !millis.is_finite() || millis >= cap {
            self.max_timeout
        } else {
            Duration::from_millis(millis.max(0.0).round() as u64)
        }
    }
}

/// Transport failures and 5xx responses are worth retrying; 4xx are not
pub fn is_transient(err: &PixelbinError) -> bool {
    !err.is_client_error()
}

/// Run `op` until it succeeds, the budget runs out, or `is_retryable` refuses.
///
/// The last error is returned as-is.
pub async fn retry<T, E, F, Fut, R>(policy: &RetryPolicy, is_retryable: R, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !is_retryable(&e) => {
                log::debug!("attempt {} failed with a non-retryable error: {}", attempt + 1, e);
                return Err(e);
            }
            Err(e) if attempt >= policy.retries => {
                log::warn!("giving up after {} attempts: {}", attempt + 1, e);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                log::warn!(
                    "attempt {} failed ({}), retrying in {:?}",
                    attempt + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
