//! Load balancer manager
//!
//! The per-gateway façade that wires the registry, health scorer, circuit
//! breaker, recovery manager, affinity table and selection algorithms
//! together. Selection lives in `selection.rs`, operator actions and
//! statistics in `admin.rs`, background tasks in `maintenance.rs`.

use super::affinity::SessionAffinityTable;
use super::circuit_breaker::CircuitBreakerBridge;
use super::health::HealthScorer;
use super::instance::{InstanceSpec, ServiceInstance};
use super::recovery::RecoveryManager;
use super::registry::{InstanceRegistry, UpsertOutcome};
use super::strategy::{Algorithm, AlgorithmStrategy, build_strategy};
use crate::config::{BalancerConfig, Config, ServiceConfig, Validate};
use crate::utils::error::{BalancerError, Result};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering::Relaxed};
use tracing::{debug, info, warn};

/// Per-service routing settings
#[derive(Debug)]
pub(crate) struct ServiceRoute {
    strategy: RwLock<Arc<dyn AlgorithmStrategy>>,
    affinity_enabled: AtomicBool,
}

impl ServiceRoute {
    fn new(strategy: Arc<dyn AlgorithmStrategy>, affinity_enabled: bool) -> Self {
        Self {
            strategy: RwLock::new(strategy),
            affinity_enabled: AtomicBool::new(affinity_enabled),
        }
    }

    pub(crate) fn strategy(&self) -> Arc<dyn AlgorithmStrategy> {
        self.strategy.read().clone()
    }

    pub(crate) fn algorithm(&self) -> Algorithm {
        self.strategy.read().algorithm()
    }

    pub(crate) fn affinity_enabled(&self) -> bool {
        self.affinity_enabled.load(Relaxed)
    }
}

/// Load balancer for every service behind the gateway
#[derive(Debug)]
pub struct LoadBalancerManager {
    pub(crate) config: BalancerConfig,
    pub(crate) registry: InstanceRegistry,
    pub(crate) affinity: Arc<SessionAffinityTable>,
    pub(crate) breaker: Arc<CircuitBreakerBridge>,
    pub(crate) scorer: HealthScorer,
    pub(crate) recovery: RecoveryManager,
    pub(crate) routes: DashMap<String, Arc<ServiceRoute>>,
}

impl LoadBalancerManager {
    /// Create a manager with no services
    ///
    /// Fails with `Validation` when any tuning value is out of range.
    pub fn new(config: BalancerConfig) -> Result<Self> {
        config.validate().map_err(|e| {
            warn!("Rejected balancer configuration: {}", e);
            BalancerError::validation(e)
        })?;

        let affinity = Arc::new(SessionAffinityTable::new(config.affinity.ttl()));
        let breaker = Arc::new(CircuitBreakerBridge::new(config.circuit_breaker.clone()));

        Ok(Self {
            registry: InstanceRegistry::new(affinity.clone(), breaker.clone()),
            scorer: HealthScorer::new(&config.health),
            recovery: RecoveryManager::new(&config.recovery),
            routes: DashMap::new(),
            affinity,
            breaker,
            config,
        })
    }

    /// Create a manager and register every statically configured service
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let manager = Self::new(config.balancer.clone())?;
        for service in &config.services {
            manager.configure_service(service);
        }
        info!(
            "Load balancer initialized with {} services",
            config.services.len()
        );
        Ok(manager)
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    pub fn affinity_table(&self) -> &SessionAffinityTable {
        &self.affinity
    }

    /// Apply a service's settings and register its instances
    pub fn configure_service(&self, service: &ServiceConfig) {
        let algorithm = service.algorithm.unwrap_or(self.config.default_algorithm);
        let affinity = service
            .session_affinity
            .unwrap_or(self.config.affinity.enabled);

        self.routes.insert(
            service.name.clone(),
            Arc::new(ServiceRoute::new(
                build_strategy(algorithm, &self.config),
                affinity,
            )),
        );
        self.registry.ensure_service(&service.name);
        for instance in &service.instances {
            self.registry.upsert(&service.name, instance.clone());
        }

        debug!(
            "Configured service {} with {} instances, algorithm {}, affinity {}",
            service.name,
            service.instances.len(),
            algorithm,
            affinity
        );
    }

    /// Add or update an instance from service discovery
    pub fn upsert_instance(&self, service: &str, spec: InstanceSpec) -> UpsertOutcome {
        self.route(service);
        self.registry.upsert(service, spec)
    }

    /// Remove an instance from service discovery
    pub fn remove_instance(&self, service: &str, host: &str) -> Option<Arc<ServiceInstance>> {
        self.registry.remove(service, host)
    }

    /// Reconcile a service against a full instance list; returns removed hosts
    pub fn replace_instances(&self, service: &str, specs: Vec<InstanceSpec>) -> Vec<String> {
        self.route(service);
        self.registry.replace(service, specs)
    }

    /// Routing settings for a service, created with the defaults on first use
    pub(crate) fn route(&self, service: &str) -> Arc<ServiceRoute> {
        if let Some(route) = self.routes.get(service) {
            return route.clone();
        }
        self.routes
            .entry(service.to_string())
            .or_insert_with(|| {
                Arc::new(ServiceRoute::new(
                    build_strategy(self.config.default_algorithm, &self.config),
                    self.config.affinity.enabled,
                ))
            })
            .clone()
    }

    /// Switch a service to another algorithm
    ///
    /// Unknown names fail with `UnknownAlgorithm` and leave the current
    /// algorithm in place.
    pub fn set_algorithm(&self, service: &str, name: &str) -> Result<()> {
        let algorithm = Algorithm::from_str(name).inspect_err(|_| {
            warn!(
                "Rejected unknown algorithm {:?} for service {}",
                name, service
            );
        })?;

        let route = self.route(service);
        let mut strategy = route.strategy.write();
        let previous = strategy.algorithm();
        if previous != algorithm {
            *strategy = build_strategy(algorithm, &self.config);
            info!(
                "Service {} switched from {} to {}",
                service, previous, algorithm
            );
        }
        Ok(())
    }

    /// Algorithm currently active for a service
    pub fn algorithm(&self, service: &str) -> Algorithm {
        self.routes
            .get(service)
            .map(|route| route.algorithm())
            .unwrap_or(self.config.default_algorithm)
    }

    /// Names of every supported algorithm
    pub fn available_algorithms(&self) -> Vec<&'static str> {
        Algorithm::ALL.iter().map(Algorithm::as_str).collect()
    }

    /// Turn session affinity on or off for a service
    ///
    /// Turning it off drops the service's existing bindings.
    pub fn set_session_affinity(&self, service: &str, enabled: bool) {
        let route = self.route(service);
        let previous = route.affinity_enabled.swap(enabled, Relaxed);
        if previous && !enabled {
            let cleared = self.affinity.clear_service(service);
            debug!("Cleared {} affinity bindings for {}", cleared, service);
        }
        if previous != enabled {
            info!("Session affinity for {} set to {}", service, enabled);
        }
    }

    pub fn session_affinity_enabled(&self, service: &str) -> bool {
        self.routes
            .get(service)
            .map(|route| route.affinity_enabled())
            .unwrap_or(self.config.affinity.enabled)
    }
}
