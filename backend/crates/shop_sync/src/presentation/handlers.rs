//! HTTP Handlers

use crate::application::scheduler::SyncScheduler;
use crate::domain::entities::{SchedulerStats, ShopSession, SyncInfo};
use crate::domain::repository::{ActivityRepository, CleanupRepository, ShopSyncer};
use crate::error::SyncError;
use crate::presentation::dto::ActivityRequest;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use gateway::{GatewayRegistry, QueueStatus, TransportFactory};
use kernel::error::app_error::{AppError, AppResult};
use kernel::shop::ShopDomain;
use std::sync::Arc;

/// Shared state for sync handlers
pub struct SyncAppState<A, S, C, F: TransportFactory> {
    pub scheduler: SyncScheduler<A, S, C>,
    pub activity: Arc<A>,
    pub gateways: Arc<GatewayRegistry<F>>,
}

impl<A, S, C, F: TransportFactory> Clone for SyncAppState<A, S, C, F> {
    fn clone(&self) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            activity: self.activity.clone(),
            gateways: self.gateways.clone(),
        }
    }
}

fn parse_shop(raw: &str) -> AppResult<ShopDomain> {
    Ok(ShopDomain::parse(raw)?)
}

/// POST /api/sync/shops/{shop}/activity
pub async fn record_activity<A, S, C, F>(
    State(state): State<SyncAppState<A, S, C, F>>,
    Path(shop): Path<String>,
    Json(req): Json<ActivityRequest>,
) -> AppResult<(StatusCode, Json<SyncInfo>)>
where
    A: ActivityRepository + Send + Sync + 'static,
    S: ShopSyncer + Send + Sync + 'static,
    C: CleanupRepository + Send + Sync + 'static,
    F: TransportFactory,
{
    let shop = parse_shop(&shop)?;
    if req.access_token.trim().is_empty() {
        return Err(AppError::bad_request("accessToken must not be empty"));
    }

    state
        .activity
        .record_activity(&shop)
        .await
        .map_err(AppError::from)?;

    let info = state
        .scheduler
        .start_sync_for_shop(ShopSession::new(shop, req.access_token));

    Ok((StatusCode::ACCEPTED, Json(info)))
}

/// GET /api/sync/shops/{shop}
pub async fn get_sync_info<A, S, C, F>(
    State(state): State<SyncAppState<A, S, C, F>>,
    Path(shop): Path<String>,
) -> AppResult<Json<SyncInfo>>
where
    A: ActivityRepository + Send + Sync + 'static,
    S: ShopSyncer + Send + Sync + 'static,
    C: CleanupRepository + Send + Sync + 'static,
    F: TransportFactory,
{
    let shop = parse_shop(&shop)?;
    match state.scheduler.sync_info(&shop) {
        Some(info) => Ok(Json(info)),
        None => Err(SyncError::ShopNotScheduled(shop).into()),
    }
}

/// GET /api/sync/shops/{shop}/queue
pub async fn get_queue_status<A, S, C, F>(
    State(state): State<SyncAppState<A, S, C, F>>,
    Path(shop): Path<String>,
) -> AppResult<Json<QueueStatus>>
where
    F: TransportFactory,
{
    let shop = parse_shop(&shop)?;
    state
        .gateways
        .queue_status(&shop)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("No gateway for shop: {}", shop)))
}

/// DELETE /api/sync/shops/{shop}
pub async fn stop_sync<A, S, C, F>(
    State(state): State<SyncAppState<A, S, C, F>>,
    Path(shop): Path<String>,
) -> AppResult<StatusCode>
where
    A: ActivityRepository + Send + Sync + 'static,
    S: ShopSyncer + Send + Sync + 'static,
    C: CleanupRepository + Send + Sync + 'static,
    F: TransportFactory,
{
    let shop = parse_shop(&shop)?;
    if !state.scheduler.stop_sync_for_shop(&shop) {
        return Err(SyncError::ShopNotScheduled(shop).into());
    }
    state.gateways.remove_idle(&shop);

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/sync/stats
pub async fn get_stats<A, S, C, F>(
    State(state): State<SyncAppState<A, S, C, F>>,
) -> Json<SchedulerStats>
where
    A: ActivityRepository + Send + Sync + 'static,
    S: ShopSyncer + Send + Sync + 'static,
    C: CleanupRepository + Send + Sync + 'static,
    F: TransportFactory,
{
    Json(state.scheduler.stats())
}
