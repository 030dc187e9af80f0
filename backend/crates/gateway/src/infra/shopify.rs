//! Shopify Admin API transport (reqwest)

use kernel::shop::ShopDomain;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::fmt;

use crate::domain::operation::{GraphqlOperation, RawResponse};
use crate::domain::transport::{AccessToken, GraphqlTransport, TransportFactory};
use crate::error::TransportError;

/// Admin API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "2025-01";

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Executes operations against `https://{shop}/admin/api/{version}/graphql.json`
#[derive(Clone)]
pub struct ShopifyTransport {
    client: reqwest::Client,
    endpoint: String,
    access_token: AccessToken,
}

impl ShopifyTransport {
    pub fn new(
        client: reqwest::Client,
        shop: &ShopDomain,
        api_version: &str,
        access_token: AccessToken,
    ) -> Self {
        Self {
            client,
            endpoint: admin_graphql_endpoint(shop, api_version),
            access_token,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Build the Admin GraphQL endpoint for a shop
pub fn admin_graphql_endpoint(shop: &ShopDomain, api_version: &str) -> String {
    format!("https://{}/admin/api/{}/graphql.json", shop, api_version)
}

// Access token stays out of logs
impl fmt::Debug for ShopifyTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyTransport")
            .field("endpoint", &self.endpoint)
            .field("access_token", &self.access_token)
            .finish()
    }
}

impl GraphqlTransport for ShopifyTransport {
    async fn execute(&self, operation: &GraphqlOperation) -> Result<RawResponse, TransportError> {
        let body = serde_json::to_vec(operation)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(ACCESS_TOKEN_HEADER, self.access_token.current())
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        if !(200..300).contains(&status) {
            tracing::debug!(endpoint = %self.endpoint, status, "Admin API returned error status");
            return Err(TransportError::Status { status, body: text });
        }

        Ok(RawResponse::new(status, text))
    }
}

/// Builds one [`ShopifyTransport`] per shop, sharing the HTTP connection pool
#[derive(Debug, Clone)]
pub struct ShopifyTransportFactory {
    client: reqwest::Client,
    api_version: String,
}

impl ShopifyTransportFactory {
    pub fn new(client: reqwest::Client, api_version: impl Into<String>) -> Self {
        Self {
            client,
            api_version: api_version.into(),
        }
    }
}

impl TransportFactory for ShopifyTransportFactory {
    type Transport = ShopifyTransport;

    fn build(&self, shop: &ShopDomain, access_token: AccessToken) -> ShopifyTransport {
        ShopifyTransport::new(self.client.clone(), shop, &self.api_version, access_token)
    }
}
