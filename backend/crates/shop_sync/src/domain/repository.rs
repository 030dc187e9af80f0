//! Repository Traits
//!
//! Interfaces for the scheduler's collaborators. Implementations are in the
//! infrastructure layer (Postgres) and the application layer (content sync).

use kernel::shop::ShopDomain;
use std::time::Duration;

use crate::domain::entities::{CleanupCriteria, ShopResource, ShopSession, SyncStats};
use crate::error::SyncResult;

/// Tenant liveness source
#[trait_variant::make(ActivityRepository: Send)]
pub trait LocalActivityRepository {
    /// Record that the shop was just seen
    async fn record_activity(&self, shop: &ShopDomain) -> SyncResult<()>;

    /// Whether the shop produced activity within `within`
    async fn is_shop_active(&self, shop: &ShopDomain, within: Duration) -> SyncResult<bool>;
}

/// "Sync all content for this shop"
#[trait_variant::make(ShopSyncer: Send)]
pub trait LocalShopSyncer {
    async fn sync_shop(&self, session: &ShopSession) -> SyncResult<SyncStats>;

    /// Free per-shop resources of shops outside `scheduled` that are no
    /// longer in use; returns how many shops were released
    fn release_unscheduled(&self, scheduled: &[ShopDomain]) -> usize;
}

/// Janitorial deletes for background tasks and request logs
#[trait_variant::make(CleanupRepository: Send)]
pub trait LocalCleanupRepository {
    /// Delete rows matching the criteria; returns rows affected
    async fn delete_matching(&self, criteria: &CleanupCriteria) -> SyncResult<u64>;
}

/// Persistence for synced content
#[trait_variant::make(ResourceRepository: Send)]
pub trait LocalResourceRepository {
    /// Insert or update resources in bulk; returns rows written
    async fn upsert_resources(&self, shop: &ShopDomain, resources: &[ShopResource])
    -> SyncResult<u64>;
}
