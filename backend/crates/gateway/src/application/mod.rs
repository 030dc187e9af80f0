//! Application Layer
//!
//! The request gateway itself and its configuration.

pub mod config;
pub mod gateway;
