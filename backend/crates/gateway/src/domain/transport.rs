//! Transport ports
//!
//! Interfaces for executing one GraphQL operation against the upstream API.
//! The Shopify implementation lives in the infrastructure layer.

use kernel::shop::ShopDomain;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::operation::{GraphqlOperation, RawResponse};
use crate::error::TransportError;

/// Single-attempt executor for GraphQL operations
#[trait_variant::make(GraphqlTransport: Send)]
pub trait LocalGraphqlTransport {
    /// Execute the operation once; no retries, no throttling
    async fn execute(&self, operation: &GraphqlOperation) -> Result<RawResponse, TransportError>;
}

/// A shop's access token, shared by the registry and the shop's transport
///
/// Rotating it changes the credential for every later request without
/// replacing the gateway in front of the transport.
#[derive(Clone)]
pub struct AccessToken(Arc<RwLock<String>>);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(token.into())))
    }

    pub fn current(&self) -> String {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the token; returns `true` if it changed
    pub fn rotate(&self, token: &str) -> bool {
        let mut current = self.0.write().unwrap_or_else(PoisonError::into_inner);
        if *current == token {
            return false;
        }
        *current = token.to_string();
        true
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Builds the transport for one shop
pub trait TransportFactory: Send + Sync + 'static {
    type Transport: GraphqlTransport + Send + Sync + 'static;

    fn build(&self, shop: &ShopDomain, access_token: AccessToken) -> Self::Transport;
}
