//! Request Gateway for the Shopify GraphQL Admin API
//!
//! Clean Architecture structure:
//! - `domain/` - Operations, responses, throttle detection, transport ports
//! - `application/` - The rate-limited, retrying request queue
//! - `infra/` - reqwest transport and per-shop registry
//!
//! ## Rate Model
//! - Client-side ceiling per fixed window (default 10 requests / 1000 ms)
//! - Throttle signals (HTTP 429, `THROTTLED` code, throttle text) back off
//!   linearly and reset the window
//! - Other transport failures retry after a fixed delay
//! - Both retry kinds share one budget (default 3 retries)

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::config::GatewayConfig;
pub use application::gateway::{QueueStatus, RequestGateway};
pub use domain::operation::{GraphqlError, GraphqlOperation, RawResponse};
pub use domain::transport::{AccessToken, GraphqlTransport, TransportFactory};
pub use error::{GatewayError, GatewayResult, TransportError};
pub use infra::registry::GatewayRegistry;
pub use infra::shopify::{DEFAULT_API_VERSION, ShopifyTransport, ShopifyTransportFactory};
