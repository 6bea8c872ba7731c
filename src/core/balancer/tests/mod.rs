//! Load balancer tests module
//!
//! Exercises the manager end to end: selection, outcome reporting, circuit
//! breaking, recovery and affinity.
