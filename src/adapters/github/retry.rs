//! Retry policy for transient API failures

use std::time::Duration;

/// Bounds for retrying transient failures and waiting out rate limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts for a request hitting network errors or 5xx
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on every further attempt
    pub base_delay: Duration,
    /// Upper bound for a single backoff delay
    pub max_delay: Duration,
    /// How many rate-limit suspensions a single request may go through
    pub rate_limit_retries: u32,
}

/// Delay schedule between attempts
pub trait BackoffPolicy {
    /// Delay after the `attempt`-th failure (1-based)
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            rate_limit_retries: 3,
        }
    }
}

impl BackoffPolicy for RetryPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}
