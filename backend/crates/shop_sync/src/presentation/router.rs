//! Sync Router

use crate::application::scheduler::SyncScheduler;
use crate::domain::repository::{ActivityRepository, CleanupRepository, ShopSyncer};
use crate::presentation::handlers::{self, SyncAppState};
use axum::{
    Router,
    routing::{get, post},
};
use gateway::{GatewayRegistry, TransportFactory};
use std::sync::Arc;

/// Create the sync router for any repository / transport implementation
pub fn sync_router<A, S, C, F>(
    scheduler: SyncScheduler<A, S, C>,
    activity: Arc<A>,
    gateways: Arc<GatewayRegistry<F>>,
) -> Router
where
    A: ActivityRepository + Send + Sync + 'static,
    S: ShopSyncer + Send + Sync + 'static,
    C: CleanupRepository + Send + Sync + 'static,
    F: TransportFactory,
{
    let state = SyncAppState {
        scheduler,
        activity,
        gateways,
    };

    Router::new()
        .route(
            "/shops/{shop}/activity",
            post(handlers::record_activity::<A, S, C, F>),
        )
        .route(
            "/shops/{shop}",
            get(handlers::get_sync_info::<A, S, C, F>).delete(handlers::stop_sync::<A, S, C, F>),
        )
        .route(
            "/shops/{shop}/queue",
            get(handlers::get_queue_status::<A, S, C, F>),
        )
        .route("/stats", get(handlers::get_stats::<A, S, C, F>))
        .with_state(state)
}
