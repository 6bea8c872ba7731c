//! Round robin

use super::{Algorithm, AlgorithmStrategy, SelectionContext, ensure_candidates};
use crate::core::balancer::instance::InstanceSnapshot;
use crate::utils::error::Result;
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

/// Cyclic cursor over the eligible set; ignores weights
#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    cursor: AtomicUsize,
}

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlgorithmStrategy for RoundRobinStrategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::RoundRobin
    }

    fn select(&self, candidates: &[InstanceSnapshot], _ctx: &SelectionContext) -> Result<usize> {
        ensure_candidates(candidates)?;
        // fetch_add wraps on overflow
        let position = self.cursor.fetch_add(1, Relaxed);
        Ok(position % candidates.len())
    }
}
