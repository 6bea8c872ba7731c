//! Upstream instance records
//!
//! This module defines the building blocks the balancer works on:
//! - `InstanceSpec`: static description supplied by service discovery
//! - `ServiceInstance`: one live upstream endpoint with its runtime state
//! - `InstanceSnapshot`: a plain copy of the fields algorithms consult
//! - `CircuitState`: per-instance breaker state
//!
//! ## Locking
//!
//! Operator flags and the in-flight counter are atomics so the selection path
//! never takes a write lock. Health, counters and circuit state live behind a
//! per-instance `RwLock`; outcome reports lock only the instance they update.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

/// Default static weight for an instance
pub const DEFAULT_WEIGHT: u32 = 100;

/// Circuit breaker state of one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Selectable
    #[default]
    Closed,
    /// Not selectable until the cooldown has elapsed
    Open,
    /// Selectable with a reduced recovery weight; any failure reopens
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Instance description supplied by the service-discovery feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    /// Unique key within a service
    pub host: String,
    /// Static weight
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Operator/discovery enable flag
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Latest result of the external health probe
    #[serde(default = "default_true")]
    pub healthy: bool,
}

impl InstanceSpec {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            weight: DEFAULT_WEIGHT,
            enabled: true,
            healthy: true,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_healthy(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }
}

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

fn default_true() -> bool {
    true
}

/// Mutable health, performance and breaker state of one instance
#[derive(Debug, Clone)]
pub(crate) struct InstanceState {
    pub total_requests: u64,
    pub success_requests: u64,
    pub failed_requests: u64,
    pub avg_response_time: Duration,
    pub last_response_time: Duration,
    /// EWMA in [0, 1]
    pub health_score: f64,
    /// 1.0 = fully trusted, < 1.0 = ramping
    pub recovery_weight: f64,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub circuit: CircuitState,
    /// When the circuit last opened
    pub opened_at: Option<Instant>,
}

impl InstanceState {
    pub fn new() -> Self {
        Self {
            total_requests: 0,
            success_requests: 0,
            failed_requests: 0,
            avg_response_time: Duration::ZERO,
            last_response_time: Duration::ZERO,
            health_score: 1.0,
            recovery_weight: 1.0,
            consecutive_failures: 0,
            consecutive_successes: 0,
            circuit: CircuitState::Closed,
            opened_at: None,
        }
    }

    /// Clear counters and performance data, keeping the breaker state
    pub fn reset_counters(&mut self) {
        self.total_requests = 0;
        self.success_requests = 0;
        self.failed_requests = 0;
        self.avg_response_time = Duration::ZERO;
        self.last_response_time = Duration::ZERO;
        self.health_score = 1.0;
    }
}

impl Default for InstanceState {
    fn default() -> Self {
        Self::new()
    }
}

/// One upstream endpoint of one logical service
///
/// Instances are created and removed by the registry; every mutable field is
/// owned by the balancer.
#[derive(Debug)]
pub struct ServiceInstance {
    host: String,
    weight: AtomicU32,
    enabled: AtomicBool,
    draining: AtomicBool,
    probe_healthy: AtomicBool,
    active_connections: AtomicU64,
    /// Unix millis of the last selection, 0 = never
    last_used_ms: AtomicI64,
    pub(crate) state: RwLock<InstanceState>,
}

impl ServiceInstance {
    pub(crate) fn from_spec(spec: &InstanceSpec) -> Self {
        Self {
            host: spec.host.clone(),
            weight: AtomicU32::new(spec.weight),
            enabled: AtomicBool::new(spec.enabled),
            draining: AtomicBool::new(false),
            probe_healthy: AtomicBool::new(spec.healthy),
            active_connections: AtomicU64::new(0),
            last_used_ms: AtomicI64::new(0),
            state: RwLock::new(InstanceState::new()),
        }
    }

    /// Overwrite static configuration, keeping runtime state
    pub(crate) fn apply_spec(&self, spec: &InstanceSpec) {
        self.weight.store(spec.weight, Relaxed);
        self.enabled.store(spec.enabled, Relaxed);
        self.probe_healthy.store(spec.healthy, Relaxed);
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn weight(&self) -> u32 {
        self.weight.load(Relaxed)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Relaxed)
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Relaxed)
    }

    /// Latest external probe result
    pub fn is_probe_healthy(&self) -> bool {
        self.probe_healthy.load(Relaxed)
    }

    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Relaxed)
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.state.read().circuit
    }

    /// Derived from the circuit: anything but Open is healthy
    pub fn is_healthy(&self) -> bool {
        self.circuit_state() != CircuitState::Open
    }

    pub fn health_score(&self) -> f64 {
        self.state.read().health_score
    }

    pub fn recovery_weight(&self) -> f64 {
        self.state.read().recovery_weight
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.read().consecutive_failures
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.state.read().consecutive_successes
    }

    pub fn total_requests(&self) -> u64 {
        self.state.read().total_requests
    }

    pub fn avg_response_time(&self) -> Duration {
        self.state.read().avg_response_time
    }

    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        match self.last_used_ms.load(Relaxed) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }

    /// Eligible for a fresh (non-sticky) selection
    pub fn is_selectable(&self) -> bool {
        self.is_enabled() && !self.is_draining() && self.is_healthy()
    }

    /// Eligible to keep serving a client already bound to it
    pub fn accepts_affinity(&self) -> bool {
        self.is_enabled() && self.is_healthy()
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Relaxed);
    }

    pub(crate) fn set_draining(&self, draining: bool) {
        self.draining.store(draining, Relaxed);
    }

    /// Record a selection: one more request in flight
    pub(crate) fn acquire(&self) {
        self.active_connections.fetch_add(1, Relaxed);
        self.last_used_ms.store(Utc::now().timestamp_millis(), Relaxed);
    }

    /// Record a completion; never drops below zero
    pub(crate) fn release(&self) {
        let _ = self
            .active_connections
            .fetch_update(Relaxed, Relaxed, |active| active.checked_sub(1));
    }

    /// Copy the fields algorithms need
    pub fn snapshot(&self) -> InstanceSnapshot {
        let state = self.state.read();
        InstanceSnapshot {
            host: self.host.clone(),
            weight: self.weight(),
            recovery_weight: state.recovery_weight,
            health_score: state.health_score,
            active_connections: self.active_connections(),
            avg_response_time: state.avg_response_time,
            circuit: state.circuit,
        }
    }
}

/// Read-only view of an instance handed to selection algorithms
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSnapshot {
    pub host: String,
    pub weight: u32,
    pub recovery_weight: f64,
    pub health_score: f64,
    pub active_connections: u64,
    pub avg_response_time: Duration,
    pub circuit: CircuitState,
}

impl InstanceSnapshot {
    /// A fully healthy, idle instance with the default weight
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            weight: DEFAULT_WEIGHT,
            recovery_weight: 1.0,
            health_score: 1.0,
            active_connections: 0,
            avg_response_time: Duration::ZERO,
            circuit: CircuitState::Closed,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_recovery_weight(mut self, recovery_weight: f64) -> Self {
        self.recovery_weight = recovery_weight;
        self
    }

    pub fn with_health_score(mut self, health_score: f64) -> Self {
        self.health_score = health_score;
        self
    }

    pub fn with_active_connections(mut self, active: u64) -> Self {
        self.active_connections = active;
        self
    }

    pub fn with_avg_response_time(mut self, avg: Duration) -> Self {
        self.avg_response_time = avg;
        self
    }

    /// Static weight scaled by the recovery ramp
    pub fn effective_weight(&self) -> f64 {
        self.weight as f64 * self.recovery_weight
    }
}
