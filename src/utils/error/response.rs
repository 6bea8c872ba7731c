//! Structured error bodies for the edge layer
//!
//! The HTTP adapter in front of the balancer renders these verbatim; it maps
//! [`BalancerError::status_code`] onto the response status.

use super::types::BalancerError;
use serde::Serialize;

impl BalancerError {
    /// HTTP status the edge should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            BalancerError::NoEligibleInstances { .. } => 503,
            BalancerError::UnknownAlgorithm(_) | BalancerError::Validation(_) => 400,
            BalancerError::InstanceNotFound { .. } => 404,
            _ => 500,
        }
    }

    /// Stable machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            BalancerError::NoEligibleInstances { .. } => "NO_ELIGIBLE_INSTANCES",
            BalancerError::UnknownAlgorithm(_) => "UNKNOWN_ALGORITHM",
            BalancerError::InstanceNotFound { .. } => "INSTANCE_NOT_FOUND",
            BalancerError::Config(_) => "CONFIG_ERROR",
            BalancerError::Validation(_) => "VALIDATION_ERROR",
            BalancerError::Io(_) => "IO_ERROR",
            BalancerError::Yaml(_) | BalancerError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Build the structured body for this error
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self.status_code() {
            500 => "An internal error occurred".to_string(),
            _ => self.to_string(),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
                request_id: None, // set by the HTTP layer
            },
        }
    }
}

/// Standard error response format
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
    pub request_id: Option<String>,
}
