//! Health-aware weighted random selection

use super::{Algorithm, AlgorithmStrategy, SelectionContext, ensure_candidates};
use crate::core::balancer::instance::InstanceSnapshot;
use crate::utils::error::Result;
use rand::Rng;

/// Picks at random with probability proportional to
/// `health_score × weight × recovery_weight`
///
/// Falls back to a uniform pick when every product is zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct HealthAwareStrategy;

impl HealthAwareStrategy {
    pub fn select_with_rng<R: Rng + ?Sized>(
        &self,
        candidates: &[InstanceSnapshot],
        rng: &mut R,
    ) -> Result<usize> {
        ensure_candidates(candidates)?;
        if candidates.len() == 1 {
            return Ok(0);
        }

        let weights: Vec<f64> = candidates.iter().map(selection_weight).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Ok(rng.gen_range(0..candidates.len()));
        }

        let mut point = rng.gen_range(0.0..total);
        for (index, weight) in weights.iter().enumerate() {
            if point < *weight {
                return Ok(index);
            }
            point -= weight;
        }

        // Rounding can leave the point past the last bucket
        Ok(weights.iter().rposition(|w| *w > 0.0).unwrap_or(0))
    }
}

pub(crate) fn selection_weight(candidate: &InstanceSnapshot) -> f64 {
    (candidate.health_score * candidate.effective_weight()).max(0.0)
}

impl AlgorithmStrategy for HealthAwareStrategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::HealthAware
    }

    fn select(&self, candidates: &[InstanceSnapshot], _ctx: &SelectionContext) -> Result<usize> {
        self.select_with_rng(candidates, &mut rand::thread_rng())
    }
}
