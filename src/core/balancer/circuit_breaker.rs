//! Per-instance circuit breaking
//!
//! ```text
//! Closed --(failure_threshold consecutive failures)--> Open
//! Open --(cooldown elapsed, probe healthy)--> HalfOpen
//! HalfOpen --(recovery_threshold consecutive successes)--> Closed
//! HalfOpen --(any failure)--> Open
//! ```
//!
//! The bridge holds no state of its own; it drives the circuit field of each
//! instance's state under that instance's write lock.

use super::instance::{CircuitState, InstanceState, ServiceInstance};
use crate::config::CircuitBreakerConfig;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A change of circuit state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitTransition {
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Circuit breaker shared by every instance
#[derive(Debug, Clone)]
pub struct CircuitBreakerBridge {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerBridge {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn cooldown(&self) -> Duration {
        self.config.cooldown()
    }

    /// Apply an outcome already folded into the run counters
    pub(crate) fn on_outcome(
        &self,
        host: &str,
        state: &mut InstanceState,
        success: bool,
    ) -> Option<CircuitTransition> {
        match (state.circuit, success) {
            (CircuitState::HalfOpen, true)
                if state.consecutive_successes >= self.config.recovery_threshold =>
            {
                debug!("Circuit for {} transitioning from HalfOpen to Closed", host);
                Some(self.close_state(state))
            }
            (CircuitState::HalfOpen, false) => {
                debug!(
                    "Circuit for {} transitioning from HalfOpen to Open due to failure",
                    host
                );
                Some(self.open_state(state))
            }
            (CircuitState::Closed, false)
                if state.consecutive_failures >= self.config.failure_threshold =>
            {
                warn!(
                    "Circuit for {} opening after {} consecutive failures",
                    host, state.consecutive_failures
                );
                Some(self.open_state(state))
            }
            _ => None,
        }
    }

    /// Open the circuit because the external probe reported the instance unhealthy
    pub(crate) fn trip(&self, instance: &ServiceInstance) -> Option<CircuitTransition> {
        let mut state = instance.state.write();
        if state.circuit == CircuitState::Open {
            return None;
        }
        warn!("Circuit for {} opening on failed health probe", instance.host());
        Some(self.open_state(&mut state))
    }

    /// Move an open circuit to half-open once its cooldown has elapsed
    ///
    /// Requires a healthy probe; the instance then serves at the reduced
    /// half-open recovery weight.
    pub(crate) fn try_half_open(
        &self,
        instance: &ServiceInstance,
        now: Instant,
    ) -> Option<CircuitTransition> {
        if !instance.is_probe_healthy() {
            return None;
        }

        {
            let state = instance.state.read();
            if state.circuit != CircuitState::Open || !self.cooldown_elapsed(&state, now) {
                return None;
            }
        }

        let mut state = instance.state.write();
        if state.circuit != CircuitState::Open || !self.cooldown_elapsed(&state, now) {
            return None;
        }

        debug!("Circuit for {} transitioning from Open to HalfOpen", instance.host());
        let from = state.circuit;
        state.circuit = CircuitState::HalfOpen;
        state.recovery_weight = self.config.half_open_weight;
        state.consecutive_failures = 0;
        state.consecutive_successes = 0;
        Some(CircuitTransition {
            from,
            to: CircuitState::HalfOpen,
        })
    }

    /// Whether an open circuit may be probed again
    pub(crate) fn cooldown_elapsed(&self, state: &InstanceState, now: Instant) -> bool {
        match state.opened_at {
            Some(opened_at) => now.saturating_duration_since(opened_at) >= self.cooldown(),
            None => true,
        }
    }

    /// Close the circuit regardless of its current state
    pub(crate) fn force_close(&self, instance: &ServiceInstance) -> Option<CircuitTransition> {
        let mut state = instance.state.write();
        let transition = self.close_state(&mut state);
        (transition.from != CircuitState::Closed).then_some(transition)
    }

    pub(crate) fn close_state(&self, state: &mut InstanceState) -> CircuitTransition {
        let from = state.circuit;
        state.circuit = CircuitState::Closed;
        state.recovery_weight = 1.0;
        state.opened_at = None;
        state.consecutive_failures = 0;
        CircuitTransition {
            from,
            to: CircuitState::Closed,
        }
    }

    fn open_state(&self, state: &mut InstanceState) -> CircuitTransition {
        let from = state.circuit;
        state.circuit = CircuitState::Open;
        state.recovery_weight = 0.0;
        state.opened_at = Some(Instant::now());
        state.consecutive_successes = 0;
        CircuitTransition {
            from,
            to: CircuitState::Open,
        }
    }
}

impl Default for CircuitBreakerBridge {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
