//! Rate Limiting Infrastructure
//!
//! Client-side fixed-window request counter used to keep outbound traffic
//! below an upstream API's budget.

use std::time::Duration;
use tokio::time::Instant;

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_millis(1000),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_millis(window_ms),
        }
    }
}

/// Fixed-window request counter
///
/// Invariant: `request_count <= max_requests` while
/// `now - window_start < window`. The window start is anchored at the first
/// request recorded into an empty window, so a window never begins before
/// the requests it counts.
#[derive(Debug, Clone)]
pub struct RateWindow {
    config: RateLimitConfig,
    request_count: u32,
    window_start: Instant,
}

impl RateWindow {
    /// A ceiling of zero would stall forever, so it is raised to one.
    pub fn new(config: RateLimitConfig, now: Instant) -> Self {
        Self {
            config: RateLimitConfig {
                max_requests: config.max_requests.max(1),
                ..config
            },
            request_count: 0,
            window_start: now,
        }
    }

    pub fn request_count(&self) -> u32 {
        self.request_count
    }

    /// Start a fresh window if the current one has elapsed.
    ///
    /// Returns `true` when the window was reset.
    pub fn roll(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.window_start) >= self.config.window {
            self.reset(now);
            true
        } else {
            false
        }
    }

    /// Whether the ceiling for the current window has been reached
    pub fn is_exhausted(&self) -> bool {
        self.request_count >= self.config.max_requests
    }

    /// Time left until the current window closes
    pub fn remaining_wait(&self, now: Instant) -> Duration {
        self.config
            .window
            .saturating_sub(now.saturating_duration_since(self.window_start))
    }

    /// Count one request issued at `now`
    pub fn record(&mut self, now: Instant) {
        if self.request_count == 0 {
            self.window_start = now;
        }
        self.request_count += 1;
    }

    pub fn reset(&mut self, now: Instant) {
        self.request_count = 0;
        self.window_start = now;
    }
}
