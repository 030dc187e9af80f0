//! Application Layer - Use cases
//!
//! - `scheduler` - per-shop sync timers and the global cleanup timer
//! - `content_sync` - the sync operation driven through the request gateway
//! - `cleanup` - janitorial deletes run by the cleanup timer

pub mod cleanup;
pub mod config;
pub mod content_sync;
pub mod scheduler;
