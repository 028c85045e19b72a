//! Retry with exponential backoff and jitter
//!
//! Shared by the network-facing transports. Only transient failures are
//! retried; a permanent or serialization failure returns immediately. An
//! operation that keeps failing makes exactly `max_retries + 1` attempts
//! before the last error is returned.

use std::time::Duration;

use evr_config::RetrySettings;
use evr_pipeline::DeliveryError;
use rand::Rng;

/// Bounds for the backoff loop
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,

    /// Delay before the first retry; doubles per attempt
    pub base_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: settings.base_delay,
            max_delay: settings.max_delay,
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or retries are exhausted
pub async fn retry<F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<(), DeliveryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), DeliveryError>>,
{
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = backoff_delay(policy, attempt);
                tracing::debug!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts = policy.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Exponential delay for the given attempt, uniformly jittered
///
/// `attempt` is zero-based: the delay before retry N. Jitter keeps a herd
/// of senders from retrying in lockstep after a shared outage.
pub(crate) fn backoff_delay(policy: &RetryPolicy, attempt: usize) -> Duration {
    let shift = attempt.min(16) as u32;
    let exponential = policy.base_delay.saturating_mul(1u32 << shift);
    let capped = exponential.min(policy.max_delay);

    let millis = capped.as_millis() as u64;
    let jittered = millis / 2 + rand::rng().random_range(0..=millis.div_ceil(2));
    Duration::from_millis(jittered)
}
