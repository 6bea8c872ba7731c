//! Adaptive selection: health discounted by relative latency
//!
//! `score = health_score × recovery_weight × (weight / max_weight) / (1 + normalized_latency)`
//! where `normalized_latency` is the instance's average response time over the
//! mean of the measured candidates. Unmeasured instances are ranked at the
//! mean. The highest score wins; ties go to fewer in-flight requests, then
//! the lowest host.

use super::least::mean_response_time;
use super::{Algorithm, AlgorithmStrategy, SelectionContext, ensure_candidates};
use crate::core::balancer::instance::InstanceSnapshot;
use crate::utils::error::Result;
use std::cmp::Ordering;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy)]
pub struct AdaptiveStrategy;

impl AdaptiveStrategy {
    /// Composite scores in candidate order
    pub fn scores(candidates: &[InstanceSnapshot]) -> Vec<f64> {
        let mean = mean_response_time(candidates);
        let max_weight = candidates.iter().map(|c| c.weight).max().unwrap_or(0);

        candidates
            .iter()
            .map(|c| {
                let weight_factor = if max_weight == 0 {
                    1.0
                } else {
                    c.weight as f64 / max_weight as f64
                };
                let latency = normalized_latency(c.avg_response_time, mean);
                c.health_score * c.recovery_weight * weight_factor / (1.0 + latency)
            })
            .collect()
    }
}

fn normalized_latency(avg: Duration, mean: Duration) -> f64 {
    if mean.is_zero() {
        return 0.0;
    }
    if avg.is_zero() {
        return 1.0;
    }
    avg.as_secs_f64() / mean.as_secs_f64()
}

impl AlgorithmStrategy for AdaptiveStrategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Adaptive
    }

    fn select(&self, candidates: &[InstanceSnapshot], _ctx: &SelectionContext) -> Result<usize> {
        ensure_candidates(candidates)?;
        let scores = Self::scores(candidates);

        let mut best = 0;
        for index in 1..candidates.len() {
            let (candidate, current) = (&candidates[index], &candidates[best]);
            let ordering = scores[index]
                .partial_cmp(&scores[best])
                .unwrap_or(Ordering::Equal)
                .then_with(|| current.active_connections.cmp(&candidate.active_connections))
                .then_with(|| current.host.cmp(&candidate.host));
            if ordering == Ordering::Greater {
                best = index;
            }
        }
        Ok(best)
    }
}
