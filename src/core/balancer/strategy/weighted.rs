//! Smooth weighted round robin
//!
//! Every selection adds each candidate's effective weight
//! (`weight × recovery_weight`) to its running score, picks the highest score
//! and takes the total effective weight off the winner. Over any window of
//! `Σ weight` selections each instance is picked in proportion to its weight,
//! fractional weights included, and picks of one instance are spread out
//! rather than served in a burst.

use super::{Algorithm, AlgorithmStrategy, SelectionContext, ensure_candidates};
use crate::core::balancer::instance::InstanceSnapshot;
use crate::utils::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct WeightedRoundRobinStrategy {
    state: Mutex<WeightedState>,
}

#[derive(Debug, Default)]
struct WeightedState {
    current: HashMap<String, f64>,
    /// Used when every effective weight is zero
    cursor: usize,
}

impl WeightedRoundRobinStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlgorithmStrategy for WeightedRoundRobinStrategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::WeightedRoundRobin
    }

    fn select(&self, candidates: &[InstanceSnapshot], _ctx: &SelectionContext) -> Result<usize> {
        ensure_candidates(candidates)?;
        let mut state = self.state.lock();

        let total: f64 = candidates
            .iter()
            .map(|c| c.effective_weight())
            .filter(|w| *w > 0.0)
            .sum();
        if total <= 0.0 {
            let index = state.cursor % candidates.len();
            state.cursor = state.cursor.wrapping_add(1);
            return Ok(index);
        }

        // Forget instances that left the eligible set
        if state.current.len() > candidates.len() {
            state
                .current
                .retain(|host, _| candidates.iter().any(|c| &c.host == host));
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            let weight = candidate.effective_weight();
            if weight <= 0.0 {
                continue;
            }
            let current = state.current.entry(candidate.host.clone()).or_insert(0.0);
            *current += weight;
            if best.is_none_or(|(_, top)| *current > top) {
                best = Some((index, *current));
            }
        }

        // total > 0 guarantees a positive-weight candidate
        let index = best.map(|(index, _)| index).unwrap_or(0);
        if let Some(current) = state.current.get_mut(&candidates[index].host) {
            *current -= total;
        }
        Ok(index)
    }
}
