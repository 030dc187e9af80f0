//! Gateway Configuration
//!
//! The defaults are a deliberately conservative fraction of Shopify's real
//! cost budget: the gateway only sees throttle signals, never the remaining
//! cost.

use platform::backoff::RetryPolicy;
use platform::rate_limit::RateLimitConfig;
use std::time::Duration;

/// Request gateway configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Request ceiling per window
    pub rate_limit: RateLimitConfig,
    /// Retry budget and linear backoff unit
    pub retry: RetryPolicy,
    /// Pause after each handled request
    pub request_gap: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            retry: RetryPolicy::default(),
            request_gap: Duration::from_millis(20),
        }
    }
}

impl GatewayConfig {
    pub fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.rate_limit = RateLimitConfig {
            max_requests,
            window,
        };
        self
    }

    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.retry = RetryPolicy::new(max_retries, base_delay);
        self
    }

    pub fn with_request_gap(mut self, request_gap: Duration) -> Self {
        self.request_gap = request_gap;
        self
    }
}
