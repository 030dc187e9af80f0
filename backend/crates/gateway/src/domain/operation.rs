//! GraphQL operation and raw response
//!
//! The gateway never interprets either side: an operation is carried to the
//! transport as-is, and the response body is handed back to the caller
//! unchanged so it can be parsed (and re-parsed) on their terms.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request descriptor: query text plus optional variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlOperation {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl GraphqlOperation {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// One entry of a GraphQL `errors` array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphqlError {
    /// `extensions.code`, when present
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }
}

/// Response as received from the transport
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Parse the body; can be called any number of times
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// The `data` member, if the body is JSON and carries one
    pub fn data(&self) -> Option<Value> {
        self.json::<Value>()
            .ok()
            .and_then(|mut v| v.get_mut("data").map(Value::take))
            .filter(|v| !v.is_null())
    }

    /// GraphQL errors carried in the body
    ///
    /// Shopify sometimes answers with `"errors": "<message>"` instead of an
    /// array; that form is surfaced as a single error without extensions.
    pub fn errors(&self) -> Vec<GraphqlError> {
        let Ok(value) = self.json::<Value>() else {
            return Vec::new();
        };

        match value.get("errors") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            Some(Value::String(message)) => vec![GraphqlError {
                message: message.clone(),
                extensions: None,
            }],
            _ => Vec::new(),
        }
    }
}
