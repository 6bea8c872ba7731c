//! Operator actions and statistics

use super::instance::{CircuitState, ServiceInstance};
use super::manager::LoadBalancerManager;
use super::recovery::RecoveryReport;
use super::stats::{AffinityEntryInfo, GlobalStats, InstanceStats, RecoveryStatus, ServiceStats};
use crate::utils::error::{BalancerError, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

impl LoadBalancerManager {
    fn require_instance(&self, service: &str, host: &str) -> Result<Arc<ServiceInstance>> {
        self.registry
            .find(service, host)
            .ok_or_else(|| BalancerError::instance_not_found(service, host))
    }

    /// Return a disabled instance to rotation
    pub fn enable_instance(&self, service: &str, host: &str) -> Result<()> {
        self.require_instance(service, host)?.set_enabled(true);
        info!("Enabled instance {} of service {}", host, service);
        Ok(())
    }

    /// Take an instance out of rotation, including for bound sessions
    pub fn disable_instance(&self, service: &str, host: &str) -> Result<()> {
        self.require_instance(service, host)?.set_enabled(false);
        info!("Disabled instance {} of service {}", host, service);
        Ok(())
    }

    /// Stop sending new sessions to an instance
    ///
    /// Requests whose affinity key is already bound to it keep arriving until
    /// the binding expires.
    pub fn drain_instance(&self, service: &str, host: &str) -> Result<()> {
        self.require_instance(service, host)?.set_draining(true);
        info!("Draining instance {} of service {}", host, service);
        Ok(())
    }

    pub fn undrain_instance(&self, service: &str, host: &str) -> Result<()> {
        self.require_instance(service, host)?.set_draining(false);
        info!("Stopped draining instance {} of service {}", host, service);
        Ok(())
    }

    /// Statistics for one service; empty for unknown services
    pub fn get_stats(&self, service: &str) -> ServiceStats {
        ServiceStats::new(
            service,
            self.algorithm(service),
            self.session_affinity_enabled(service),
            self.list_instances(service),
            self.affinity.len_for(service),
        )
    }

    /// Statistics for every service
    pub fn get_global_stats(&self) -> GlobalStats {
        let services = self
            .registry
            .services()
            .iter()
            .map(|service| self.get_stats(service))
            .collect();
        GlobalStats::from_services(services, self.affinity.len())
    }

    pub fn list_instances(&self, service: &str) -> Vec<InstanceStats> {
        self.registry
            .instances(service)
            .iter()
            .map(|instance| InstanceStats::from_instance(instance))
            .collect()
    }

    pub fn get_instance(&self, service: &str, host: &str) -> Result<InstanceStats> {
        let instance = self.require_instance(service, host)?;
        Ok(InstanceStats::from_instance(&instance))
    }

    pub fn affinity_entries(&self, service: &str) -> Vec<AffinityEntryInfo> {
        self.affinity.entries(service)
    }

    /// Drop every affinity binding of a service
    pub fn clear_affinity(&self, service: &str) -> usize {
        let cleared = self.affinity.clear_service(service);
        info!("Cleared {} affinity bindings for {}", cleared, service);
        cleared
    }

    /// Instances of a service that are open or still ramping back up
    pub fn recovery_status(&self, service: &str) -> Vec<RecoveryStatus> {
        let now = Instant::now();
        let cooldown = self.breaker.cooldown();

        self.registry
            .instances(service)
            .iter()
            .filter_map(|instance| {
                let state = instance.state.read();
                if state.circuit == CircuitState::Closed {
                    return None;
                }
                let cooldown_remaining_ms = match (state.circuit, state.opened_at) {
                    (CircuitState::Open, Some(opened_at)) => Some(
                        cooldown
                            .saturating_sub(now.saturating_duration_since(opened_at))
                            .as_millis() as u64,
                    ),
                    _ => None,
                };
                Some(RecoveryStatus {
                    host: instance.host().to_string(),
                    circuit_state: state.circuit,
                    recovery_weight: state.recovery_weight,
                    consecutive_successes: state.consecutive_successes,
                    probe_healthy: instance.is_probe_healthy(),
                    cooldown_remaining_ms,
                })
            })
            .collect()
    }

    /// Close an instance's circuit at full weight and clear its counters
    pub fn force_recovery(&self, service: &str, host: &str) -> Result<()> {
        let instance = self.require_instance(service, host)?;
        self.breaker.force_close(&instance);
        {
            let mut state = instance.state.write();
            state.reset_counters();
            state.consecutive_successes = 0;
        }
        info!("Forced recovery of instance {} of service {}", host, service);
        Ok(())
    }

    /// Clear request counters and performance data, keeping circuit state
    pub fn reset_instance_stats(&self, service: &str, host: &str) -> Result<()> {
        self.require_instance(service, host)?
            .state
            .write()
            .reset_counters();
        info!("Reset statistics of instance {} of service {}", host, service);
        Ok(())
    }

    /// Run one recovery pass now
    pub fn recovery_tick(&self) -> RecoveryReport {
        self.recovery.tick(&self.registry, &self.breaker)
    }

    /// Drop expired affinity bindings now
    pub fn sweep_affinity(&self) -> usize {
        self.affinity.sweep()
    }
}
