//! Configuration validation
//!
//! - `trait_def`: Core Validate trait definition
//! - `balancer_validators`: Balancer and service validators

mod balancer_validators;
mod trait_def;

pub use trait_def::Validate;
