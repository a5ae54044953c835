//! Retry policy for external capability calls
//!
//! Transient failures (timeouts, rate limits, unavailable backends) are
//! retried with exponential backoff; permanent failures return at once.
//! Each attempt is bounded by `attempt_timeout`, and an attempt that runs
//! past it counts as a `Timeout`.

use crate::ai::CapabilityError;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub factor: u32,
    /// Upper bound on any single wait, including server `Retry-After`
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            factor: 2,
            max_delay: Duration::from_secs(30),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): base · factor^(retry-1)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let multiplier = self.factor.max(1).saturating_pow(exponent);
        self.base_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, CapabilityError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CapabilityError>>,
    {
        let mut retries = 0u32;
        loop {
            let attempt = match tokio::time::timeout(self.attempt_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(CapabilityError::Timeout(self.attempt_timeout)),
            };
            match attempt {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    let mut delay = self.delay_for_retry(retries);
                    if let CapabilityError::RateLimited {
                        retry_after: Some(retry_after),
                        ..
                    } = &e
                    {
                        delay = delay.max((*retry_after).min(self.max_delay));
                    }
                    tracing::warn!(
                        "{}: transient failure ({}), retry {}/{} in {}ms",
                        label,
                        e,
                        retries,
                        self.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::error!("{}: giving up after {} retries: {}", label, retries, e);
                    } else {
                        tracing::debug!("{}: permanent failure, not retrying: {}", label, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}
