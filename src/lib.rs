//! # gateway-balancer
//!
//! Load-balancing and traffic-management core for an API gateway.
//!
//! ## Features
//!
//! - **Seven algorithms**: round robin, weighted round robin, least connections,
//!   least response time, health-aware, consistent hash and adaptive (default)
//! - **Health scoring**: EWMA over success and relative latency per instance
//! - **Circuit breaking**: Closed / Open / HalfOpen per instance
//! - **Gradual recovery**: recovered instances ramp back to full weight
//! - **Session affinity**: sliding-TTL sticky bindings with draining support
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gateway_balancer::{InstanceSpec, LoadBalancerManager, config::BalancerConfig};
//! use std::time::Duration;
//!
//! # fn main() -> gateway_balancer::Result<()> {
//! let balancer = LoadBalancerManager::new(BalancerConfig::default())?;
//! balancer.upsert_instance("orders", InstanceSpec::new("10.0.0.1:8080"));
//! balancer.upsert_instance("orders", InstanceSpec::new("10.0.0.2:8080"));
//!
//! let instance = balancer.select_instance("orders", "")?;
//! // ... forward the request ...
//! balancer.report_outcome("orders", instance.host(), true, Duration::from_millis(12));
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use crate::core::balancer::{
    Algorithm, CircuitState, InstanceSpec, LoadBalancerManager, MaintenanceHandle,
    SelectionContext, ServiceInstance, ServiceStats,
};
pub use utils::error::{BalancerError, Result};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Build timestamp (unix seconds)
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
    /// Rust version
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: option_env!("BUILD_TIME").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
        }
    }
}

/// Build
pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}
