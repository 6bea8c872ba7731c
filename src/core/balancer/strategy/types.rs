//! Algorithm identifiers and the per-call selection context

use crate::utils::error::BalancerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Load balancing algorithm selectable per service
///
/// ## Algorithms
///
/// - **RoundRobin**: cyclic cursor, fair over any window of N selections
/// - **WeightedRoundRobin**: smooth weighted rotation proportional to effective weight
/// - **LeastConnections**: fewest in-flight requests, ties by lowest host
/// - **LeastResponseTime**: lowest average response time, ties by lowest host
/// - **HealthAware**: weighted random by health score × weight × recovery weight
/// - **ConsistentHash**: hash ring over hosts keyed by affinity key or client address
/// - **Adaptive**: argmax of health score discounted by normalized latency (default)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    RoundRobin,
    WeightedRoundRobin,
    LeastConnections,
    LeastResponseTime,
    HealthAware,
    ConsistentHash,
    #[default]
    Adaptive,
}

impl Algorithm {
    /// Every known algorithm, in presentation order
    pub const ALL: [Algorithm; 7] = [
        Algorithm::RoundRobin,
        Algorithm::WeightedRoundRobin,
        Algorithm::LeastConnections,
        Algorithm::LeastResponseTime,
        Algorithm::HealthAware,
        Algorithm::ConsistentHash,
        Algorithm::Adaptive,
    ];

    /// Canonical name used in configuration and by the admin surface
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::RoundRobin => "round_robin",
            Algorithm::WeightedRoundRobin => "weighted_round_robin",
            Algorithm::LeastConnections => "least_connections",
            Algorithm::LeastResponseTime => "least_response_time",
            Algorithm::HealthAware => "health_aware",
            Algorithm::ConsistentHash => "consistent_hash",
            Algorithm::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = BalancerError;

    /// Parses canonical names; `-` is accepted in place of `_` and case is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Algorithm::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.as_str() == normalized)
            .ok_or_else(|| BalancerError::unknown_algorithm(s))
    }
}

/// Per-request inputs an algorithm may consult
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContext {
    /// Sticky key (session id or client hash)
    pub affinity_key: Option<String>,
    /// Address of the downstream client, used when no affinity key is supplied
    pub client_addr: Option<IpAddr>,
}

impl SelectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the affinity key; empty keys are treated as absent
    pub fn with_affinity_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.affinity_key = (!key.is_empty()).then_some(key);
        self
    }

    pub fn with_client_addr(mut self, addr: IpAddr) -> Self {
        self.client_addr = Some(addr);
        self
    }

    /// Key used for hash-based routing: the affinity key, else the client address
    pub fn routing_key(&self) -> Option<String> {
        self.affinity_key
            .clone()
            .or_else(|| self.client_addr.map(|addr| addr.to_string()))
    }
}
