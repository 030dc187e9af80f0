//! API DTOs (Data Transfer Objects)

use serde::Deserialize;

/// Request for POST /api/sync/shops/{shop}/activity
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    pub access_token: String,
}
