//! Retry Policy
//!
//! Bounded retries with a linear delay (`base_delay × attempt`).

use std::time::Duration;

/// Retry policy shared by throttle and transient-failure retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Delay unit, multiplied by the attempt number
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Whether a request that has already been retried `retry_count` times
    /// may be retried again
    pub fn can_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Upper bound on delivery attempts for one request
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
