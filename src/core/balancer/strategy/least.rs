//! Least connections and least response time
//!
//! Both are deterministic: ties go to the lowest host.

use super::{Algorithm, AlgorithmStrategy, SelectionContext, argmin_by_host};
use crate::core::balancer::instance::InstanceSnapshot;
use crate::utils::error::Result;
use std::time::Duration;

/// Fewest in-flight requests
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastConnectionsStrategy;

impl AlgorithmStrategy for LeastConnectionsStrategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::LeastConnections
    }

    fn select(&self, candidates: &[InstanceSnapshot], _ctx: &SelectionContext) -> Result<usize> {
        argmin_by_host(candidates, |c| c.active_connections)
    }
}

/// Lowest average response time
///
/// Instances without any measured response time are ranked at the mean of the
/// measured ones, so they get traffic without jumping the queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastResponseTimeStrategy;

impl AlgorithmStrategy for LeastResponseTimeStrategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::LeastResponseTime
    }

    fn select(&self, candidates: &[InstanceSnapshot], _ctx: &SelectionContext) -> Result<usize> {
        let mean = mean_response_time(candidates);
        argmin_by_host(candidates, |c| {
            if c.avg_response_time.is_zero() {
                mean
            } else {
                c.avg_response_time
            }
        })
    }
}

/// Mean of the non-zero average response times, zero when none are measured
pub(crate) fn mean_response_time(candidates: &[InstanceSnapshot]) -> Duration {
    let measured: Vec<Duration> = candidates
        .iter()
        .map(|c| c.avg_response_time)
        .filter(|d| !d.is_zero())
        .collect();
    if measured.is_empty() {
        return Duration::ZERO;
    }
    measured.iter().sum::<Duration>() / measured.len() as u32
}
