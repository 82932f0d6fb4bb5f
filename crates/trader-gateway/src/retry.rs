//! Retry logic with exponential backoff
//!
//! Transient failures (transport errors, timeouts, HTTP 500 and 503) are
//! retried; everything else is returned after the first attempt.

use crate::error::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Capped exponential backoff for transient gateway failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Backoff before the second attempt
    pub initial_backoff: Duration,

    /// Upper bound for any single backoff
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(4),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Create a policy with fast retries (for testing)
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(25),
            backoff_multiplier: 2.0,
        }
    }

    /// Backoff to wait before retry number `attempt` (1-based)
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let backoff_ms =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(exponent);

        if !backoff_ms.is_finite() || backoff_ms >= self.max_backoff.as_millis() as f64 {
            return self.max_backoff;
        }

        Duration::from_millis(backoff_ms as u64)
    }

    /// Every wait the policy would perform if all attempts failed
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .map(|attempt| self.backoff_duration(attempt))
            .collect()
    }

    /// Run `operation` until it succeeds, fails permanently, or the
    /// attempts run out
    ///
    /// Returns the first success, the first non-transient error, or the
    /// last transient error.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("{}: attempt {}/{}", operation_name, attempt, attempts);

            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            if attempt >= attempts {
                warn!("{}: giving up after {} attempts: {}", operation_name, attempts, error);
                return Err(error);
            }

            let backoff = self.backoff_duration(attempt);
            warn!(
                "{}: {} failed ({}), retrying in {:?}",
                operation_name,
                error.kind(),
                error,
                backoff
            );
            sleep(backoff).await;
            attempt += 1;
        }
    }
}
