//! Configuration loading from environment variables
//!
//! Every key is optional. Values found override whatever the base
//! configuration already holds.

use super::Config;
use crate::core::balancer::strategy::Algorithm;
use crate::utils::error::{BalancerError, Result};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

/// Prefix shared by every recognised variable
pub const ENV_PREFIX: &str = "BALANCER_";

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_env_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_env_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut config = Self::default();
        config.apply_env_overrides(vars)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `BALANCER_*` overrides on top of this configuration
    pub fn apply_env_overrides<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();

        debug!("Applying {} environment overrides", vars.len());

        let balancer = &mut self.balancer;
        if let Some(value) = vars.get("BALANCER_DEFAULT_ALGORITHM") {
            balancer.default_algorithm = Algorithm::from_str(value)?;
        }

        set_parsed(&vars, "BALANCER_FAILURE_THRESHOLD", &mut balancer.circuit_breaker.failure_threshold)?;
        set_parsed(&vars, "BALANCER_RECOVERY_THRESHOLD", &mut balancer.circuit_breaker.recovery_threshold)?;
        set_parsed(&vars, "BALANCER_COOLDOWN_MS", &mut balancer.circuit_breaker.cooldown_ms)?;
        set_parsed(&vars, "BALANCER_HALF_OPEN_WEIGHT", &mut balancer.circuit_breaker.half_open_weight)?;
        set_parsed(&vars, "BALANCER_RECOVERY_INTERVAL_MS", &mut balancer.recovery.interval_ms)?;
        set_parsed(&vars, "BALANCER_RECOVERY_STEP", &mut balancer.recovery.step)?;
        set_parsed(&vars, "BALANCER_AFFINITY_ENABLED", &mut balancer.affinity.enabled)?;
        set_parsed(&vars, "BALANCER_AFFINITY_TTL_MS", &mut balancer.affinity.ttl_ms)?;
        set_parsed(&vars, "BALANCER_AFFINITY_SWEEP_INTERVAL_MS", &mut balancer.affinity.sweep_interval_ms)?;
        set_parsed(&vars, "BALANCER_SMOOTHING_ALPHA", &mut balancer.health.smoothing_alpha)?;
        set_parsed(&vars, "BALANCER_BASELINE_LATENCY_MS", &mut balancer.health.baseline_latency_ms)?;
        set_parsed(&vars, "BALANCER_VIRTUAL_NODES", &mut balancer.consistent_hash.virtual_nodes)?;

        if let Some(level) = vars.get("BALANCER_LOG_LEVEL") {
            self.logging.level = level.clone();
        }
        set_parsed(&vars, "BALANCER_LOG_JSON", &mut self.logging.json)?;

        Ok(())
    }
}

fn set_parsed<T>(vars: &HashMap<String, String>, key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = vars.get(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| BalancerError::config(format!("Invalid {}: {}", key, e)))?;
    }
    Ok(())
}
