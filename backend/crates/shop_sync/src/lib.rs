//! Background Shop Sync
//!
//! Clean Architecture structure:
//! - `domain/` - Entities and collaborator ports (liveness, sync, cleanup)
//! - `application/` - Scheduler, content sync, cleanup use cases
//! - `infra/` - PostgreSQL implementations
//! - `presentation/` - HTTP handlers
//!
//! ## Scheduling Model
//! - One recurring timer per active shop (default every 40 s)
//! - Each tick checks liveness (default 5 min threshold); inactive shops lose their timer
//! - At most one sync cycle per shop at a time; overlapping ticks are skipped
//! - Sync failures are logged and retried on the next tick
//! - A single global cleanup timer runs once immediately, then hourly

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::SchedulerConfig;
pub use application::content_sync::ContentSyncService;
pub use application::scheduler::SyncScheduler;
pub use domain::entities::{SchedulerStats, ShopSession, SyncInfo, SyncStats};
pub use error::{SyncError, SyncResult};
pub use infra::postgres::PgSyncRepository;
pub use presentation::router::sync_router;

#[cfg(test)]
mod tests;
