//! Integration tests for gateway-balancer
//!
//! These tests drive the balancer through its public API only.

pub mod balancer_tests;
pub mod concurrency_tests;
pub mod config_tests;
pub mod maintenance_tests;
