//! Domain Layer - Scheduling vocabulary and collaborator ports
//!
//! This layer contains:
//! - Domain entities (ShopSession, SyncStats, SyncInfo, CleanupCriteria)
//! - Repository traits (liveness, sync operation, cleanup, content store)

pub mod entities;
pub mod repository;
