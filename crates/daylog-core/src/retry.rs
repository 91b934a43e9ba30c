//! Bounded exponential-backoff retry
//!
//! Every remote call the reconciler makes goes through [`retry`]. The wrapper
//! only ever retries errors that report themselves as transient; anything
//! else is handed back on the first attempt. After the last attempt the
//! final error is returned as-is, never wrapped.
//!
//! The delay before retry `n` (0-based) is `base_delay * 2^n`, so the default
//! policy of 3 attempts with a 1s base waits 1s, then 2s.

use std::fmt::Display;
use std::time::Duration;

use tracing::warn;

/// Errors that know whether trying again could help
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// How many times to try and how long to wait between tries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Policy that retries without waiting
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Delay to wait after the failure of attempt `attempt_index` (0-based)
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let multiplier = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BASE_DELAY)
    }
}

/// Run `op` under `policy`, sleeping the current thread between attempts
pub fn retry<T, E, F>(policy: &RetryPolicy, operation: &str, op: F) -> Result<T, E>
where
    E: Retryable + Display,
    F: FnMut() -> Result<T, E>,
{
    retry_with_sleep(policy, operation, std::thread::sleep, op)
}

/// Like [`retry`], with the sleep function supplied by the caller
pub fn retry_with_sleep<T, E, F, S>(
    policy: &RetryPolicy,
    operation: &str,
    mut sleep: S,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable + Display,
    F: FnMut() -> Result<T, E>,
    S: FnMut(Duration),
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) if attempt + 1 >= max_attempts => {
                warn!(
                    operation,
                    attempts = max_attempts,
                    error = %err,
                    "giving up"
                );
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, retrying"
                );
                sleep(delay);
                attempt += 1;
            }
        }
    }
}
