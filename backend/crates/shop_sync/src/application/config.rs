//! Application Configuration
//!
//! Timing configuration for the sync scheduler and the cleanup loop.

use std::time::Duration;

/// Smallest period handed to `tokio::time::interval`
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Period between sync cycles for one shop
    pub sync_interval: Duration,
    /// A shop with no activity within this window is descheduled
    pub inactivity_threshold: Duration,
    /// Period between cleanup runs
    pub cleanup_interval: Duration,
    /// Terminal background tasks older than this are deleted
    pub task_retention: Duration,
    /// Processed request logs older than this are deleted
    pub request_log_retention: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(40),
            inactivity_threshold: Duration::from_secs(5 * 60),
            cleanup_interval: Duration::from_secs(60 * 60),
            task_retention: Duration::from_secs(3 * 24 * 60 * 60),
            request_log_retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl SchedulerConfig {
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    pub fn with_inactivity_threshold(mut self, threshold: Duration) -> Self {
        self.inactivity_threshold = threshold;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub(crate) fn sync_period(&self) -> Duration {
        self.sync_interval.max(MIN_PERIOD)
    }

    pub(crate) fn cleanup_period(&self) -> Duration {
        self.cleanup_interval.max(MIN_PERIOD)
    }
}
