//! Load balancer configuration

use crate::core::balancer::strategy::Algorithm;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Load balancer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BalancerConfig {
    /// Algorithm for services that do not configure their own
    #[serde(default)]
    pub default_algorithm: Algorithm,
    /// Circuit breaker configuration
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Recovery ramp configuration
    #[serde(default)]
    pub recovery: RecoveryConfig,
    /// Session affinity configuration
    #[serde(default)]
    pub affinity: AffinityConfig,
    /// Health scoring configuration
    #[serde(default)]
    pub health: HealthScoreConfig,
    /// Consistent hash ring configuration
    #[serde(default)]
    pub consistent_hash: ConsistentHashConfig,
}

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Consecutive half-open successes that close the circuit
    #[serde(default = "default_recovery_threshold")]
    pub recovery_threshold: u32,
    /// Time an open circuit waits before going half-open, in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Recovery weight assigned on entering half-open
    #[serde(default = "default_half_open_weight")]
    pub half_open_weight: f64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_threshold: default_recovery_threshold(),
            cooldown_ms: default_cooldown_ms(),
            half_open_weight: default_half_open_weight(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Recovery ramp configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Interval between recovery ticks, in milliseconds
    #[serde(default = "default_recovery_interval_ms")]
    pub interval_ms: u64,
    /// Recovery weight added per tick
    #[serde(default = "default_recovery_step")]
    pub step: f64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_recovery_interval_ms(),
            step: default_recovery_step(),
        }
    }
}

impl RecoveryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Session affinity configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityConfig {
    /// Affinity on by default for every service
    #[serde(default)]
    pub enabled: bool,
    /// Sliding expiration of a binding, in milliseconds
    #[serde(default = "default_affinity_ttl_ms")]
    pub ttl_ms: u64,
    /// Interval between sweeps of expired bindings, in milliseconds
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_ms: default_affinity_ttl_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl AffinityConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// Health scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScoreConfig {
    /// EWMA smoothing constant
    #[serde(default = "default_smoothing_alpha")]
    pub smoothing_alpha: f64,
    /// Latency at or below which a success counts fully, in milliseconds
    #[serde(default = "default_baseline_latency_ms")]
    pub baseline_latency_ms: u64,
}

impl Default for HealthScoreConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: default_smoothing_alpha(),
            baseline_latency_ms: default_baseline_latency_ms(),
        }
    }
}

impl HealthScoreConfig {
    pub fn baseline_latency(&self) -> Duration {
        Duration::from_millis(self.baseline_latency_ms)
    }
}

/// Consistent hash ring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistentHashConfig {
    /// Ring points per instance
    #[serde(default = "default_virtual_nodes")]
    pub virtual_nodes: u32,
}

impl Default for ConsistentHashConfig {
    fn default() -> Self {
        Self {
            virtual_nodes: default_virtual_nodes(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_threshold() -> u32 {
    3
}

fn default_cooldown_ms() -> u64 {
    30_000
}

fn default_half_open_weight() -> f64 {
    0.1
}

fn default_recovery_interval_ms() -> u64 {
    30_000
}

fn default_recovery_step() -> f64 {
    0.1
}

fn default_affinity_ttl_ms() -> u64 {
    1_800_000
}

fn default_sweep_interval_ms() -> u64 {
    60_000
}

fn default_smoothing_alpha() -> f64 {
    0.1
}

fn default_baseline_latency_ms() -> u64 {
    50
}

fn default_virtual_nodes() -> u32 {
    100
}
