use crate::config::RetryConfig;
use crate::error::{NaasError, NaasResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded exponential backoff keyed on error transience
///
/// Transient errors are retried up to `max_attempts` total attempts; anything
/// else is returned immediately. Exhausting the budget yields
/// [`NaasError::RetryExhausted`] wrapping the last error.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
    jitter_factor: f64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
            jitter_factor: config.jitter_factor,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retrying after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let mut delay_ms =
            self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);

        if self.jitter_factor > 0.0 {
            let jitter = fastrand::f64() * self.jitter_factor;
            delay_ms *= 1.0 + jitter;
        }

        let capped = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Run `operation` until it succeeds, fails permanently, or the budget runs out
    ///
    /// The closure receives the 1-based attempt number.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> NaasResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = NaasResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_fn(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = %operation, attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) if error.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = %operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Transient failure, will retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) if error.is_transient() => {
                    warn!(
                        operation = %operation,
                        attempts = attempt,
                        error = %error,
                        "Retry budget exhausted"
                    );
                    return Err(NaasError::RetryExhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }
}
