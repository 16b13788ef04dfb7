use std::fmt::Display;
use std::thread;
use std::time::Duration;

use shipwright_config::RetryConfig;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

/// Delays between attempts: doubling from the base delay, capped at the
/// maximum, one fewer than the attempt limit.
pub(crate) fn backoff(policy: RetryConfig) -> impl Iterator<Item = Duration> {
    let base_ms = u64::try_from(policy.base_delay().as_millis()).unwrap_or(u64::MAX);
    let retries = usize::try_from(policy.max_attempts().saturating_sub(1)).unwrap_or(usize::MAX);
    let randomise = policy.jitter();

    // from_millis(2) doubles per step; the factor scales it back to the base
    ExponentialBackoff::from_millis(2)
        .factor(base_ms / 2)
        .max_delay(policy.max_delay())
        .map(move |delay| if randomise { jitter(delay) } else { delay })
        .take(retries)
}

/// Runs `operation` until it succeeds or the policy's attempts are used up,
/// sleeping out the [`backoff`] delays in between. The closure receives the
/// one-based attempt number. Only the final error is returned.
pub(crate) fn with_retry<T, E, F>(policy: RetryConfig, operation: &str, mut attempt: F) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let max_attempts = policy.max_attempts().max(1);
    let mut delays = backoff(policy);
    let mut current = 1;
    loop {
        match attempt(current) {
            Ok(value) => {
                if current > 1 {
                    debug!(operation, attempt = current, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                let Some(delay) = delays.next() else {
                    return Err(e);
                };
                warn!(
                    operation,
                    attempt = current,
                    max_attempts,
                    ?delay,
                    error = %e,
                    "attempt failed, retrying"
                );
                thread::sleep(delay);
                current += 1;
            }
        }
    }
}
