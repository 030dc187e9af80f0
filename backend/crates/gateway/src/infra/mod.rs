//! Infrastructure Layer
//!
//! Shopify transport (reqwest) and the per-shop gateway registry.

pub mod registry;
pub mod shopify;
