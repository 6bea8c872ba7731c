//! Sticky client-to-instance bindings
//!
//! Bindings are keyed by `(service, session key)` and expire on a sliding
//! TTL: every hit pushes the deadline out again. Expired bindings are dropped
//! lazily on lookup and in bulk by [`SessionAffinityTable::sweep`].

use super::stats::AffinityEntryInfo;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AffinityKey {
    service: String,
    session_key: String,
}

impl AffinityKey {
    fn new(service: &str, session_key: &str) -> Self {
        Self {
            service: service.to_string(),
            session_key: session_key.to_string(),
        }
    }
}

/// One binding
#[derive(Debug, Clone)]
pub struct SessionAffinityEntry {
    pub session_key: String,
    pub instance_host: String,
    pub expires_at: Instant,
    pub ttl: Duration,
    pub created_at: DateTime<Utc>,
}

impl SessionAffinityEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Concurrent affinity table shared by all services
#[derive(Debug)]
pub struct SessionAffinityTable {
    entries: DashMap<AffinityKey, SessionAffinityEntry>,
    default_ttl: Duration,
}

impl SessionAffinityTable {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Bound host for the key, refreshing the TTL on a hit
    pub fn get(&self, service: &str, session_key: &str) -> Option<String> {
        self.get_if(service, session_key, |_| true)
    }

    /// Bound host for the key if `eligible` accepts it
    ///
    /// Expired bindings and bindings to hosts `eligible` rejects are deleted.
    pub fn get_if<F>(&self, service: &str, session_key: &str, eligible: F) -> Option<String>
    where
        F: FnOnce(&str) -> bool,
    {
        let key = AffinityKey::new(service, session_key);
        let now = Instant::now();

        let host = {
            let mut entry = self.entries.get_mut(&key)?;
            if entry.is_expired(now) {
                None
            } else {
                entry.expires_at = now + entry.ttl;
                Some(entry.instance_host.clone())
            }
        };

        match host {
            Some(host) if eligible(&host) => Some(host),
            Some(host) => {
                debug!(
                    "Dropping affinity {} -> {} for {}: instance no longer eligible",
                    session_key, host, service
                );
                self.entries
                    .remove_if(&key, |_, entry| entry.instance_host == host);
                None
            }
            None => {
                self.entries
                    .remove_if(&key, |_, entry| entry.is_expired(now));
                None
            }
        }
    }

    /// Bind the key to a host, replacing any previous binding
    pub fn set(&self, service: &str, session_key: &str, host: &str, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.insert(
            AffinityKey::new(service, session_key),
            SessionAffinityEntry {
                session_key: session_key.to_string(),
                instance_host: host.to_string(),
                expires_at: Instant::now() + ttl,
                ttl,
                created_at: Utc::now(),
            },
        );
    }

    pub fn remove(&self, service: &str, session_key: &str) -> bool {
        self.entries
            .remove(&AffinityKey::new(service, session_key))
            .is_some()
    }

    /// Remove a session key from every service
    pub fn remove_key(&self, session_key: &str) -> usize {
        self.retain_counting(|key, _| key.session_key != session_key)
    }

    /// Remove every binding to a host
    pub fn remove_host(&self, service: &str, host: &str) -> usize {
        self.retain_counting(|key, entry| key.service != service || entry.instance_host != host)
    }

    pub fn clear_service(&self, service: &str) -> usize {
        self.retain_counting(|key, _| key.service != service)
    }

    /// Live bindings of a service, ordered by session key
    pub fn entries(&self, service: &str) -> Vec<AffinityEntryInfo> {
        let now = Instant::now();
        let mut entries: Vec<AffinityEntryInfo> = self
            .entries
            .iter()
            .filter(|item| item.key().service == service && !item.value().is_expired(now))
            .map(|item| {
                let entry = item.value();
                AffinityEntryInfo {
                    session_key: entry.session_key.clone(),
                    instance_host: entry.instance_host.clone(),
                    created_at: entry.created_at,
                    expires_in_ms: entry.expires_at.saturating_duration_since(now).as_millis()
                        as u64,
                }
            })
            .collect();
        entries.sort_by(|a, b| a.session_key.cmp(&b.session_key));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len_for(&self, service: &str) -> usize {
        self.entries
            .iter()
            .filter(|item| item.key().service == service)
            .count()
    }

    /// Drop expired bindings; returns how many were removed
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let removed = self.retain_counting(|_, entry| !entry.is_expired(now));
        if removed > 0 {
            debug!("Swept {} expired affinity bindings", removed);
        }
        removed
    }

    fn retain_counting<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&AffinityKey, &SessionAffinityEntry) -> bool,
    {
        let mut removed = 0;
        self.entries.retain(|key, entry| {
            let kept = keep(key, entry);
            if !kept {
                removed += 1;
            }
            kept
        });
        removed
    }
}
