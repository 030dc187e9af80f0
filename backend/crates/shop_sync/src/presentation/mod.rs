//! Presentation Layer
//!
//! HTTP handlers and DTOs for the sync API.

pub mod dto;
pub mod handlers;
pub mod router;
