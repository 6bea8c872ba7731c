//! Error types for the balancer

use thiserror::Error;

/// Result type alias for the balancer
pub type Result<T> = std::result::Result<T, BalancerError>;

/// Main error type for the balancer
///
/// Selection errors are always returned to the immediate caller. Health and
/// circuit transitions never produce errors; they only show up in later
/// selection outcomes and in statistics.
#[derive(Error, Debug)]
pub enum BalancerError {
    /// Every instance of the service is disabled, circuit-open, draining or absent
    #[error("No eligible instances for service: {service}")]
    NoEligibleInstances { service: String },

    /// The requested algorithm name is not one of the known strategies
    #[error("Unknown load balancing algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The host is not registered for the service
    #[error("Instance {host} not found for service {service}")]
    InstanceNotFound { service: String, host: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
