//! Balancer configuration validators
//!
//! Validation implementations for BalancerConfig, its sections, and
//! statically configured services.

use super::trait_def::Validate;
use crate::config::models::*;
use crate::core::balancer::instance::InstanceSpec;
use std::collections::HashSet;
use tracing::debug;

impl Validate for BalancerConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating balancer configuration");

        self.circuit_breaker.validate()?;
        self.recovery.validate()?;
        self.affinity.validate()?;
        self.health.validate()?;
        self.consistent_hash.validate()?;

        Ok(())
    }
}

impl Validate for CircuitBreakerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("Circuit breaker failure threshold must be greater than 0".to_string());
        }

        if self.recovery_threshold == 0 {
            return Err("Circuit breaker recovery threshold must be greater than 0".to_string());
        }

        if self.cooldown_ms == 0 {
            return Err("Circuit breaker cooldown must be greater than 0".to_string());
        }

        if !(self.half_open_weight > 0.0 && self.half_open_weight <= 1.0) {
            return Err("Circuit breaker half-open weight must be in (0, 1]".to_string());
        }

        Ok(())
    }
}

impl Validate for RecoveryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.interval_ms == 0 {
            return Err("Recovery interval must be greater than 0".to_string());
        }

        if !(self.step > 0.0 && self.step <= 1.0) {
            return Err("Recovery step must be in (0, 1]".to_string());
        }

        Ok(())
    }
}

impl Validate for AffinityConfig {
    fn validate(&self) -> Result<(), String> {
        if self.ttl_ms == 0 {
            return Err("Affinity TTL must be greater than 0".to_string());
        }

        if self.sweep_interval_ms == 0 {
            return Err("Affinity sweep interval must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for HealthScoreConfig {
    fn validate(&self) -> Result<(), String> {
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err("Health smoothing alpha must be in (0, 1]".to_string());
        }

        if self.baseline_latency_ms == 0 {
            return Err("Health baseline latency must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for ConsistentHashConfig {
    fn validate(&self) -> Result<(), String> {
        if self.virtual_nodes == 0 {
            return Err("Consistent hash virtual nodes must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Service name cannot be empty".to_string());
        }

        let mut hosts = HashSet::new();
        for instance in &self.instances {
            instance
                .validate()
                .map_err(|e| format!("{} in service {}", e, self.name))?;
            if !hosts.insert(instance.host.as_str()) {
                return Err(format!(
                    "Duplicate instance {} in service {}",
                    instance.host, self.name
                ));
            }
        }

        Ok(())
    }
}

impl Validate for InstanceSpec {
    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Instance host cannot be empty".to_string());
        }

        Ok(())
    }
}
