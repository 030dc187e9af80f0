//! Sync Error Types
//!
//! This module provides sync-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use gateway::GatewayError;
use kernel::error::app_error::AppError;
use kernel::shop::{ShopDomain, ShopDomainError};
use thiserror::Error;

/// Sync-specific result type alias
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A gateway request failed terminally
    #[error("Admin API request failed: {0}")]
    Gateway(#[from] GatewayError),

    /// The Admin API answered with something we cannot read
    #[error("Unexpected Admin API response: {0}")]
    UnexpectedResponse(String),

    /// Shop is not scheduled
    #[error("Shop is not scheduled: {0}")]
    ShopNotScheduled(ShopDomain),

    #[error("Invalid shop domain: {0}")]
    InvalidShop(#[from] ShopDomainError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Gateway(e) if e.is_rate_limited() => {
                AppError::too_many_requests(e.to_string()).with_source(e)
            }
            SyncError::Gateway(e) => AppError::bad_gateway(e.to_string()).with_source(e),
            SyncError::UnexpectedResponse(msg) => AppError::bad_gateway(msg),
            SyncError::ShopNotScheduled(shop) => {
                AppError::not_found(format!("Shop is not scheduled: {}", shop))
            }
            SyncError::InvalidShop(e) => e.into(),
            SyncError::Database(e) => e.into(),
            SyncError::Internal(msg) => AppError::internal(msg),
        }
    }
}
