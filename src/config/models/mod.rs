//! Configuration data models
//!
//! This module defines all configuration structures used by the balancer.

pub mod balancer;
pub mod logging;
pub mod service;

// Re-export all configuration types
pub use balancer::*;
pub use logging::*;
pub use service::*;

