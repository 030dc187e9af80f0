//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Client-side rate limiting (fixed request window)
//! - Retry policy with linear backoff

pub mod backoff;
pub mod rate_limit;
