//! Helper functions for creating specific error types

use super::types::BalancerError;

impl BalancerError {
    pub fn no_eligible<S: Into<String>>(service: S) -> Self {
        Self::NoEligibleInstances {
            service: service.into(),
        }
    }

    pub fn unknown_algorithm<S: Into<String>>(name: S) -> Self {
        Self::UnknownAlgorithm(name.into())
    }

    pub fn instance_not_found<S: Into<String>, H: Into<String>>(service: S, host: H) -> Self {
        Self::InstanceNotFound {
            service: service.into(),
            host: host.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the caller may retry the same call and expect a different result.
    ///
    /// Retry policy belongs to the proxy, so nothing produced here is retryable.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
