//! Gateway Error Types

use thiserror::Error;

/// Gateway result type alias
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures reported by a transport for a single dispatch attempt
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Upstream answered with a non-success HTTP status
    #[error("Upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS or timeout failure before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// The operation could not be encoded
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl TransportError {
    /// HTTP status, if the upstream produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => TransportError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => TransportError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Serialization(err.to_string())
    }
}

/// Terminal outcome of a submitted operation
///
/// Throttling and transient transport failures are retried inside the
/// gateway; callers only ever see one of these.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Upstream kept throttling until the retry budget ran out
    #[error("Rate limit exceeded after maximum retries ({attempts} attempts)")]
    RateLimitExceeded { attempts: u32 },

    /// A non-throttle failure persisted through every retry
    #[error("Request failed after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// Removed from the queue by `clear_queue` before dispatch
    #[error("Request queue cleared")]
    QueueCleared,

    /// The drain loop went away without resolving the request
    #[error("Gateway shut down before the request completed")]
    Closed,
}

impl GatewayError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GatewayError::RateLimitExceeded { .. })
    }
}
