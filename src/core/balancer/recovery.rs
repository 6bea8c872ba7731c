//! Gradual reintroduction of recovered instances
//!
//! Each tick promotes open circuits whose cooldown has elapsed to half-open,
//! then raises the recovery weight of half-open instances by one step. An
//! instance whose weight reaches 1.0 has its circuit closed.

use super::circuit_breaker::CircuitBreakerBridge;
use super::instance::CircuitState;
use super::registry::InstanceRegistry;
use crate::config::RecoveryConfig;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What one recovery tick changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Open -> HalfOpen
    pub promoted: Vec<String>,
    /// Recovery weight raised, still half-open
    pub ramped: Vec<String>,
    /// Ramp finished, circuit closed
    pub closed: Vec<String>,
}

impl RecoveryReport {
    pub fn is_empty(&self) -> bool {
        self.promoted.is_empty() && self.ramped.is_empty() && self.closed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RecoveryManager {
    step: f64,
    interval: Duration,
}

impl RecoveryManager {
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            step: config.step,
            interval: config.interval(),
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one recovery pass over every registered instance
    pub fn tick(&self, registry: &InstanceRegistry, breaker: &CircuitBreakerBridge) -> RecoveryReport {
        let now = Instant::now();
        let mut report = RecoveryReport::default();

        for (service, instance) in registry.all_instances() {
            let label = format!("{}/{}", service, instance.host());

            if breaker.try_half_open(&instance, now).is_some() {
                report.promoted.push(label);
                continue;
            }

            if !instance.is_probe_healthy() {
                continue;
            }

            let mut state = instance.state.write();
            if state.circuit != CircuitState::HalfOpen || state.consecutive_failures > 0 {
                continue;
            }

            state.recovery_weight = (state.recovery_weight + self.step).clamp(0.0, 1.0);
            if state.recovery_weight >= 1.0 {
                breaker.close_state(&mut state);
                info!("Instance {} fully recovered", label);
                report.closed.push(label);
            } else {
                debug!(
                    "Instance {} recovery weight raised to {:.2}",
                    label, state.recovery_weight
                );
                report.ramped.push(label);
            }
        }

        report
    }
}

impl Default for RecoveryManager {
    fn default() -> Self {
        Self::new(&RecoveryConfig::default())
    }
}
