//! Registry of services and their upstream instances
//!
//! Service discovery feeds the registry through [`InstanceRegistry::upsert`],
//! [`InstanceRegistry::remove`] and [`InstanceRegistry::replace`]. Instances
//! are handed out as `Arc`s so selection never holds a registry lock while an
//! algorithm runs.

use super::affinity::SessionAffinityTable;
use super::circuit_breaker::CircuitBreakerBridge;
use super::instance::{InstanceSpec, ServiceInstance};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Instances of one logical service, in registration order
#[derive(Debug)]
pub struct ServiceEntry {
    name: String,
    instances: RwLock<Vec<Arc<ServiceInstance>>>,
}

impl ServiceEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instances: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instances(&self) -> Vec<Arc<ServiceInstance>> {
        self.instances.read().clone()
    }

    pub fn find(&self, host: &str) -> Option<Arc<ServiceInstance>> {
        self.instances
            .read()
            .iter()
            .find(|instance| instance.host() == host)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }
}

/// Thread-safe registry keyed by service name
#[derive(Debug)]
pub struct InstanceRegistry {
    services: DashMap<String, Arc<ServiceEntry>>,
    affinity: Arc<SessionAffinityTable>,
    breaker: Arc<CircuitBreakerBridge>,
}

impl InstanceRegistry {
    pub fn new(affinity: Arc<SessionAffinityTable>, breaker: Arc<CircuitBreakerBridge>) -> Self {
        Self {
            services: DashMap::new(),
            affinity,
            breaker,
        }
    }

    /// Entry for a service, creating an empty one if needed
    pub fn ensure_service(&self, service: &str) -> Arc<ServiceEntry> {
        self.services
            .entry(service.to_string())
            .or_insert_with(|| Arc::new(ServiceEntry::new(service)))
            .clone()
    }

    pub fn service(&self, service: &str) -> Option<Arc<ServiceEntry>> {
        self.services.get(service).map(|entry| entry.clone())
    }

    pub fn contains_service(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }

    /// Registered service names, sorted
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Snapshot of a service's instances; empty for unknown services
    pub fn instances(&self, service: &str) -> Vec<Arc<ServiceInstance>> {
        self.service(service)
            .map(|entry| entry.instances())
            .unwrap_or_default()
    }

    pub fn find(&self, service: &str, host: &str) -> Option<Arc<ServiceInstance>> {
        self.service(service)?.find(host)
    }

    /// Every instance of every service
    pub fn all_instances(&self) -> Vec<(String, Arc<ServiceInstance>)> {
        let entries: Vec<Arc<ServiceEntry>> =
            self.services.iter().map(|e| e.value().clone()).collect();
        entries
            .iter()
            .flat_map(|entry| {
                entry
                    .instances()
                    .into_iter()
                    .map(|instance| (entry.name.clone(), instance))
            })
            .collect()
    }

    /// Add an instance or update the static fields of an existing one
    ///
    /// Runtime state survives updates. A spec reporting the instance unhealthy
    /// opens its circuit.
    pub fn upsert(&self, service: &str, spec: InstanceSpec) -> UpsertOutcome {
        let entry = self.ensure_service(service);

        let (instance, outcome) = {
            let mut instances = entry.instances.write();
            match instances.iter().find(|i| i.host() == spec.host) {
                Some(existing) => {
                    existing.apply_spec(&spec);
                    (existing.clone(), UpsertOutcome::Updated)
                }
                None => {
                    let instance = Arc::new(ServiceInstance::from_spec(&spec));
                    instances.push(instance.clone());
                    (instance, UpsertOutcome::Inserted)
                }
            }
        };

        match outcome {
            UpsertOutcome::Inserted => info!("Registered instance {} for service {}", spec.host, service),
            UpsertOutcome::Updated => debug!("Updated instance {} for service {}", spec.host, service),
        }

        if !spec.healthy {
            self.breaker.trip(&instance);
        }

        outcome
    }

    /// Remove an instance and every affinity binding to it
    pub fn remove(&self, service: &str, host: &str) -> Option<Arc<ServiceInstance>> {
        let entry = self.service(service)?;
        let removed = {
            let mut instances = entry.instances.write();
            let index = instances.iter().position(|i| i.host() == host)?;
            instances.remove(index)
        };

        let evicted = self.affinity.remove_host(service, host);
        info!(
            "Removed instance {} from service {} ({} affinity bindings evicted)",
            host, service, evicted
        );
        Some(removed)
    }

    /// Reconcile a service against a full instance list from discovery
    ///
    /// Returns the hosts that were removed.
    pub fn replace(&self, service: &str, specs: Vec<InstanceSpec>) -> Vec<String> {
        let wanted: HashSet<&str> = specs.iter().map(|s| s.host.as_str()).collect();
        let stale: Vec<String> = self
            .instances(service)
            .iter()
            .map(|i| i.host().to_string())
            .filter(|host| !wanted.contains(host.as_str()))
            .collect();

        for host in &stale {
            self.remove(service, host);
        }
        for spec in specs {
            self.upsert(service, spec);
        }
        stale
    }

    /// Drop a service with all its instances and bindings
    pub fn remove_service(&self, service: &str) -> bool {
        let removed = self.services.remove(service).is_some();
        if removed {
            self.affinity.clear_service(service);
            info!("Removed service {}", service);
        }
        removed
    }
}
