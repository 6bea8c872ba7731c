//! Core functionality
//!
//! This module contains the load balancing logic and its data structures.

pub mod balancer;
