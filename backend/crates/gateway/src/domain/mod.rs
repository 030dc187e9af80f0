//! Domain Layer
//!
//! This layer contains:
//! - Operation / response values carried through the gateway
//! - Throttle signal detection
//! - Transport ports (interfaces)

pub mod operation;
pub mod throttle;
pub mod transport;
