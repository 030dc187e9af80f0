//! Throttle detection
//!
//! The gateway has no view of the upstream cost budget; it only reacts to
//! black-box signals: HTTP 429, a `THROTTLED` extension code, or error text
//! mentioning throttling or a rate limit.

use crate::domain::operation::RawResponse;
use crate::error::TransportError;

/// `extensions.code` value Shopify uses for cost throttling
pub const THROTTLED_CODE: &str = "THROTTLED";

/// HTTP status for rate limiting
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Classification of one dispatch attempt
#[derive(Debug)]
pub enum Outcome {
    /// Delivered without any throttle signal
    Delivered(RawResponse),
    /// Upstream asked us to slow down; retry with backoff
    Throttled,
    /// Any other failure; retry after the fixed delay
    Failed(TransportError),
}

/// Case-insensitive match on "throttled" / "rate limit"
pub fn is_throttle_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("throttled") || lower.contains("rate limit")
}

/// Whether a transport-level success still carries a throttle signal
pub fn response_is_throttled(response: &RawResponse) -> bool {
    if response.status == TOO_MANY_REQUESTS {
        return true;
    }

    response
        .errors()
        .iter()
        .any(|e| e.code() == Some(THROTTLED_CODE) || is_throttle_message(&e.message))
}

/// Whether a transport failure is a rate-limit signal
pub fn error_is_throttled(error: &TransportError) -> bool {
    match error {
        TransportError::Status { status, body } => {
            *status == TOO_MANY_REQUESTS || is_throttle_message(body)
        }
        TransportError::Network(message) => is_throttle_message(message),
        TransportError::Serialization(_) => false,
    }
}

/// Classify the result of a single dispatch
pub fn classify(result: Result<RawResponse, TransportError>) -> Outcome {
    match result {
        Ok(response) if response_is_throttled(&response) => Outcome::Throttled,
        Ok(response) => Outcome::Delivered(response),
        Err(error) if error_is_throttled(&error) => Outcome::Throttled,
        Err(error) => Outcome::Failed(error),
    }
}
