//! Load balancing core
//!
//! Selects an upstream instance for every request routed to a backend
//! service, tracks per-instance health, breaks circuits on repeated failure,
//! reintroduces recovered instances gradually and keeps clients sticky when
//! session affinity is enabled.
//!
//! ## Module Organization
//!
//! - **instance**: instance records and snapshots
//! - **registry**: services and their instances
//! - **health**: EWMA health scoring
//! - **circuit_breaker**: per-instance circuit state machine
//! - **recovery**: recovery-weight ramp
//! - **affinity**: session affinity table
//! - **strategy**: the seven selection algorithms
//! - **manager**: the façade tying it together

pub mod affinity;
mod admin;
pub mod circuit_breaker;
pub mod health;
pub mod instance;
mod maintenance;
pub mod manager;
pub mod recovery;
pub mod registry;
mod selection;
pub mod stats;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use affinity::{SessionAffinityEntry, SessionAffinityTable};
pub use circuit_breaker::{CircuitBreakerBridge, CircuitTransition};
pub use health::HealthScorer;
pub use instance::{CircuitState, InstanceSnapshot, InstanceSpec, ServiceInstance};
pub use maintenance::MaintenanceHandle;
pub use manager::LoadBalancerManager;
pub use recovery::{RecoveryManager, RecoveryReport};
pub use registry::{InstanceRegistry, ServiceEntry, UpsertOutcome};
pub use stats::{AffinityEntryInfo, GlobalStats, InstanceStats, RecoveryStatus, ServiceStats};
pub use strategy::{Algorithm, AlgorithmStrategy, SelectionContext, build_strategy};
