//! Error handling for the balancer
//!
//! This module defines the error taxonomy returned by the load-balancing core
//! and the structured body the edge layer renders for it.

mod helpers;
mod response;
mod types;

pub use response::{ErrorDetail, ErrorResponse};
pub use types::{BalancerError, Result};
