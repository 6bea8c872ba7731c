//! Test fixtures and data factories
//!
//! Builders for managers with a single service named `svc`.

use gateway_balancer::config::{BalancerConfig, CircuitBreakerConfig};
use gateway_balancer::{Algorithm, InstanceSpec, LoadBalancerManager};
use std::collections::HashMap;
use std::time::Duration;

pub const SERVICE: &str = "svc";

/// Builder for a manager with one service
pub struct ServiceFixture {
    config: BalancerConfig,
    instances: Vec<InstanceSpec>,
}

impl ServiceFixture {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            config: BalancerConfig {
                default_algorithm: algorithm,
                ..Default::default()
            },
            instances: Vec::new(),
        }
    }

    pub fn instance(mut self, host: &str) -> Self {
        self.instances.push(InstanceSpec::new(host));
        self
    }

    pub fn weighted(mut self, host: &str, weight: u32) -> Self {
        self.instances.push(InstanceSpec::new(host).with_weight(weight));
        self
    }

    pub fn with_affinity(mut self, ttl: Duration) -> Self {
        self.config.affinity.enabled = true;
        self.config.affinity.ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.circuit_breaker = CircuitBreakerConfig {
            cooldown_ms: cooldown.as_millis() as u64,
            ..self.config.circuit_breaker
        };
        self
    }

    pub fn with_recovery_interval(mut self, interval: Duration) -> Self {
        self.config.recovery.interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.config.affinity.sweep_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn build(self) -> LoadBalancerManager {
        let manager = LoadBalancerManager::new(self.config).expect("invalid fixture config");
        for spec in self.instances {
            manager.upsert_instance(SERVICE, spec);
        }
        manager
    }
}

/// Select `n` times, reporting a fast success after each, and count per host
pub fn selection_counts(manager: &LoadBalancerManager, n: usize) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for _ in 0..n {
        let instance = manager.select_instance(SERVICE, "").expect("selection failed");
        *counts.entry(instance.host().to_string()).or_default() += 1;
        manager.report_outcome(SERVICE, instance.host(), true, Duration::from_millis(5));
    }
    counts
}

/// Report `n` identical outcomes for a host
pub fn report_many(
    manager: &LoadBalancerManager,
    host: &str,
    n: usize,
    success: bool,
    latency: Duration,
) {
    for _ in 0..n {
        manager.report_outcome(SERVICE, host, success, latency);
    }
}
