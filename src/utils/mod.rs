//! Utility modules
//!
//! - **error**: error type, result alias and error responses
//! - **logging**: tracing subscriber setup

pub mod error;
pub mod logging;
