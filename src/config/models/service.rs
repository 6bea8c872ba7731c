//! Statically configured services

use crate::core::balancer::instance::InstanceSpec;
use crate::core::balancer::strategy::Algorithm;
use serde::{Deserialize, Serialize};

/// A service and its initial instance list
///
/// Discovery may later add, update or remove instances; this only seeds the
/// registry at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Logical service name
    pub name: String,
    /// Algorithm override (falls back to the balancer default)
    #[serde(default)]
    pub algorithm: Option<Algorithm>,
    /// Session affinity override (falls back to the balancer default)
    #[serde(default)]
    pub session_affinity: Option<bool>,
    /// Initial instances
    #[serde(default)]
    pub instances: Vec<InstanceSpec>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            algorithm: None,
            session_affinity: None,
            instances: Vec::new(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_session_affinity(mut self, enabled: bool) -> Self {
        self.session_affinity = Some(enabled);
        self
    }

    pub fn with_instance(mut self, instance: InstanceSpec) -> Self {
        self.instances.push(instance);
        self
    }
}
