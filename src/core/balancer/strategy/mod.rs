//! Instance selection algorithms
//!
//! Every algorithm implements [`AlgorithmStrategy`] over a slice of
//! snapshots of the eligible instances and returns the index it picked.
//! Strategies keep only their own cursors or running scores; they never touch
//! instance state.

mod adaptive;
mod consistent_hash;
mod health_aware;
mod least;
mod round_robin;
mod types;
mod weighted;

pub use adaptive::AdaptiveStrategy;
pub use consistent_hash::ConsistentHashStrategy;
pub use health_aware::HealthAwareStrategy;
pub use least::{LeastConnectionsStrategy, LeastResponseTimeStrategy};
pub use round_robin::RoundRobinStrategy;
pub use types::{Algorithm, SelectionContext};
pub use weighted::WeightedRoundRobinStrategy;

use super::instance::InstanceSnapshot;
use crate::config::BalancerConfig;
use crate::utils::error::{BalancerError, Result};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

/// A selection algorithm
pub trait AlgorithmStrategy: Send + Sync + Debug {
    fn algorithm(&self) -> Algorithm;

    /// Pick one of `candidates`, returning its index
    ///
    /// Fails with `NoEligibleInstances` when `candidates` is empty.
    fn select(&self, candidates: &[InstanceSnapshot], ctx: &SelectionContext) -> Result<usize>;
}

/// Build a fresh strategy instance for an algorithm
pub fn build_strategy(algorithm: Algorithm, config: &BalancerConfig) -> Arc<dyn AlgorithmStrategy> {
    match algorithm {
        Algorithm::RoundRobin => Arc::new(RoundRobinStrategy::new()),
        Algorithm::WeightedRoundRobin => Arc::new(WeightedRoundRobinStrategy::new()),
        Algorithm::LeastConnections => Arc::new(LeastConnectionsStrategy),
        Algorithm::LeastResponseTime => Arc::new(LeastResponseTimeStrategy),
        Algorithm::HealthAware => Arc::new(HealthAwareStrategy),
        Algorithm::ConsistentHash => Arc::new(ConsistentHashStrategy::new(
            config.consistent_hash.virtual_nodes,
        )),
        Algorithm::Adaptive => Arc::new(AdaptiveStrategy),
    }
}

pub(crate) fn ensure_candidates(candidates: &[InstanceSnapshot]) -> Result<()> {
    if candidates.is_empty() {
        return Err(BalancerError::no_eligible(""));
    }
    Ok(())
}

/// Index of the smallest `key`, ties broken by lowest host
pub(crate) fn argmin_by_host<K, F>(candidates: &[InstanceSnapshot], key: F) -> Result<usize>
where
    K: PartialOrd,
    F: Fn(&InstanceSnapshot) -> K,
{
    ensure_candidates(candidates)?;
    let mut best = 0;
    for (index, candidate) in candidates.iter().enumerate().skip(1) {
        let current = &candidates[best];
        let ordering = key(candidate)
            .partial_cmp(&key(current))
            .unwrap_or(Ordering::Equal)
            .then_with(|| candidate.host.cmp(&current.host));
        if ordering == Ordering::Less {
            best = index;
        }
    }
    Ok(best)
}
