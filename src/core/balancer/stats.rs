//! Read-only statistics reported by the manager

use super::instance::{CircuitState, ServiceInstance};
use super::strategy::Algorithm;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-instance statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceStats {
    pub host: String,
    pub weight: u32,
    pub enabled: bool,
    pub draining: bool,
    pub healthy: bool,
    pub probe_healthy: bool,
    pub circuit_state: CircuitState,
    /// Half-open and ramping back to full weight
    pub recovering: bool,
    pub health_score: f64,
    pub recovery_weight: f64,
    pub active_connections: u64,
    pub total_requests: u64,
    pub success_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub avg_response_time_ms: f64,
    pub last_response_time_ms: f64,
    pub last_used: Option<DateTime<Utc>>,
}

impl InstanceStats {
    pub fn from_instance(instance: &ServiceInstance) -> Self {
        let state = instance.state.read();
        let success_rate = if state.total_requests == 0 {
            1.0
        } else {
            state.success_requests as f64 / state.total_requests as f64
        };

        Self {
            host: instance.host().to_string(),
            weight: instance.weight(),
            enabled: instance.is_enabled(),
            draining: instance.is_draining(),
            healthy: state.circuit != CircuitState::Open,
            probe_healthy: instance.is_probe_healthy(),
            circuit_state: state.circuit,
            recovering: state.circuit == CircuitState::HalfOpen,
            health_score: state.health_score,
            recovery_weight: state.recovery_weight,
            active_connections: instance.active_connections(),
            total_requests: state.total_requests,
            success_requests: state.success_requests,
            failed_requests: state.failed_requests,
            success_rate,
            consecutive_failures: state.consecutive_failures,
            consecutive_successes: state.consecutive_successes,
            avg_response_time_ms: state.avg_response_time.as_secs_f64() * 1000.0,
            last_response_time_ms: state.last_response_time.as_secs_f64() * 1000.0,
            last_used: instance.last_used(),
        }
    }
}

/// Per-service statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStats {
    pub service: String,
    pub algorithm: Algorithm,
    pub session_affinity: bool,
    pub total_instances: usize,
    pub eligible_instances: usize,
    pub open_circuits: usize,
    pub recovering_instances: usize,
    pub draining_instances: usize,
    pub active_connections: u64,
    pub total_requests: u64,
    pub affinity_entries: usize,
    pub instances: Vec<InstanceStats>,
}

impl ServiceStats {
    pub fn new(
        service: &str,
        algorithm: Algorithm,
        session_affinity: bool,
        instances: Vec<InstanceStats>,
        affinity_entries: usize,
    ) -> Self {
        Self {
            service: service.to_string(),
            algorithm,
            session_affinity,
            total_instances: instances.len(),
            eligible_instances: instances
                .iter()
                .filter(|i| i.enabled && !i.draining && i.healthy)
                .count(),
            open_circuits: instances
                .iter()
                .filter(|i| i.circuit_state == CircuitState::Open)
                .count(),
            recovering_instances: instances.iter().filter(|i| i.recovering).count(),
            draining_instances: instances.iter().filter(|i| i.draining).count(),
            active_connections: instances.iter().map(|i| i.active_connections).sum(),
            total_requests: instances.iter().map(|i| i.total_requests).sum(),
            affinity_entries,
            instances,
        }
    }
}

/// Statistics across every service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStats {
    pub total_services: usize,
    pub total_instances: usize,
    pub eligible_instances: usize,
    pub open_circuits: usize,
    pub recovering_instances: usize,
    pub active_connections: u64,
    pub total_requests: u64,
    pub affinity_entries: usize,
    pub services: Vec<ServiceStats>,
    pub timestamp: DateTime<Utc>,
}

impl GlobalStats {
    pub fn from_services(services: Vec<ServiceStats>, affinity_entries: usize) -> Self {
        Self {
            total_services: services.len(),
            total_instances: services.iter().map(|s| s.total_instances).sum(),
            eligible_instances: services.iter().map(|s| s.eligible_instances).sum(),
            open_circuits: services.iter().map(|s| s.open_circuits).sum(),
            recovering_instances: services.iter().map(|s| s.recovering_instances).sum(),
            active_connections: services.iter().map(|s| s.active_connections).sum(),
            total_requests: services.iter().map(|s| s.total_requests).sum(),
            affinity_entries,
            services,
            timestamp: Utc::now(),
        }
    }
}

/// Recovery progress of one instance that is not fully closed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryStatus {
    pub host: String,
    pub circuit_state: CircuitState,
    pub recovery_weight: f64,
    pub consecutive_successes: u32,
    pub probe_healthy: bool,
    /// Milliseconds until an open circuit may go half-open
    pub cooldown_remaining_ms: Option<u64>,
}

/// One live affinity binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffinityEntryInfo {
    pub session_key: String,
    pub instance_host: String,
    pub created_at: DateTime<Utc>,
    pub expires_in_ms: u64,
}
