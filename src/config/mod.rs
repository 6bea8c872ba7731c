//! Configuration management for the balancer
//!
//! This module handles loading, validation, and merging of balancer configuration.

pub mod loader;
pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{BalancerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Load balancer tuning
    #[serde(default)]
    pub balancer: BalancerConfig,
    /// Logging setup for the host binary
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Statically configured services
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

impl Config {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path).await?;

        let config = Self::from_yaml_str(&content)?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate configuration from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;

        config.validate()?;
        Ok(config)
    }

    /// Get balancer configuration
    pub fn balancer(&self) -> &BalancerConfig {
        &self.balancer
    }

    /// Get configured services
    pub fn services(&self) -> &[ServiceConfig] {
        &self.services
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.balancer
            .validate()
            .map_err(|e| BalancerError::config(format!("Balancer config error: {}", e)))?;

        let mut seen = std::collections::HashSet::new();
        for service in &self.services {
            if !seen.insert(service.name.as_str()) {
                return Err(BalancerError::config(format!(
                    "Duplicate service name: {}",
                    service.name
                )));
            }
            service
                .validate()
                .map_err(|e| BalancerError::config(format!("Service config error: {}", e)))?;
        }

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    ///
    /// Balancer and logging sections are replaced wholesale; services are
    /// merged by name.
    pub fn merge(mut self, other: Self) -> Self {
        self.balancer = other.balancer;
        self.logging = other.logging;

        let mut services: BTreeMap<String, ServiceConfig> = self
            .services
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect();
        for service in other.services {
            services.insert(service.name.clone(), service);
        }
        self.services = services.into_values().collect();
        self
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
