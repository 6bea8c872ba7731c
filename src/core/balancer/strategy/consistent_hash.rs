//! Consistent hashing over instance hosts
//!
//! Each host owns `virtual_nodes` points on a 64-bit ring. A routing key maps
//! to the first point at or after its hash, wrapping to the start of the ring.
//! Adding or removing a host only moves the keys that land on its points.

use super::{Algorithm, AlgorithmStrategy, SelectionContext, ensure_candidates};
use crate::core::balancer::instance::InstanceSnapshot;
use crate::utils::error::Result;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

/// Stable 64-bit hash of a key
pub fn hash_key(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Hash ring built from a set of hosts
#[derive(Debug, Clone, Default)]
pub struct HashRing {
    ring: BTreeMap<u64, String>,
    /// Sorted member hosts
    members: Vec<String>,
}

impl HashRing {
    pub fn new<I, S>(hosts: I, virtual_nodes: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut members: Vec<String> = hosts.into_iter().map(Into::into).collect();
        members.sort();
        members.dedup();

        let mut ring = BTreeMap::new();
        for host in &members {
            for i in 0..virtual_nodes.max(1) {
                ring.insert(hash_key(&format!("{}#{}", host, i)), host.clone());
            }
        }
        Self { ring, members }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Host owning the key
    pub fn lookup(&self, key: &str) -> Option<&str> {
        let hash = hash_key(key);
        self.ring
            .range(hash..)
            .next()
            .or_else(|| self.ring.iter().next())
            .map(|(_, host)| host.as_str())
    }
}

/// Routes by affinity key, else client address
///
/// Requests carrying neither rotate over the candidates.
#[derive(Debug)]
pub struct ConsistentHashStrategy {
    virtual_nodes: u32,
    ring: RwLock<HashRing>,
    cursor: AtomicUsize,
}

impl ConsistentHashStrategy {
    pub fn new(virtual_nodes: u32) -> Self {
        Self {
            virtual_nodes: virtual_nodes.max(1),
            ring: RwLock::new(HashRing::default()),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn virtual_nodes(&self) -> u32 {
        self.virtual_nodes
    }

    fn lookup(&self, candidates: &[InstanceSnapshot], key: &str) -> Option<String> {
        let mut hosts: Vec<&str> = candidates.iter().map(|c| c.host.as_str()).collect();
        hosts.sort_unstable();
        hosts.dedup();

        {
            let ring = self.ring.read();
            if ring.members().iter().map(String::as_str).eq(hosts.iter().copied()) {
                return ring.lookup(key).map(str::to_string);
            }
        }

        let rebuilt = HashRing::new(hosts, self.virtual_nodes);
        let host = rebuilt.lookup(key).map(str::to_string);
        *self.ring.write() = rebuilt;
        host
    }
}

impl AlgorithmStrategy for ConsistentHashStrategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ConsistentHash
    }

    fn select(&self, candidates: &[InstanceSnapshot], ctx: &SelectionContext) -> Result<usize> {
        ensure_candidates(candidates)?;

        let Some(key) = ctx.routing_key() else {
            return Ok(self.cursor.fetch_add(1, Relaxed) % candidates.len());
        };

        let index = self
            .lookup(candidates, &key)
            .and_then(|host| candidates.iter().position(|c| c.host == host))
            .unwrap_or(0);
        Ok(index)
    }
}
