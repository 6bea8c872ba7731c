//! Common test utilities for gateway-balancer

pub mod assertions;
pub mod fixtures;

pub use fixtures::{ServiceFixture, selection_counts};
