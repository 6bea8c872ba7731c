//! Instance selection and outcome reporting
//!
//! These are the two calls on every proxied request: pick an instance before
//! forwarding, report how it went afterwards.

use super::instance::{CircuitState, InstanceSnapshot, ServiceInstance};
use super::manager::LoadBalancerManager;
use super::strategy::SelectionContext;
use crate::utils::error::{BalancerError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

impl LoadBalancerManager {
    /// Select an instance for a request
    ///
    /// An empty `affinity_key` means the request carries none.
    pub fn select_instance(&self, service: &str, affinity_key: &str) -> Result<Arc<ServiceInstance>> {
        let ctx = SelectionContext::new().with_affinity_key(affinity_key);
        self.select_instance_with(service, &ctx)
    }

    /// Select an instance for a request described by `ctx`
    ///
    /// # Flow
    ///
    /// 1. Promote open circuits whose cooldown has elapsed
    /// 2. If affinity is on and the key is bound to a usable instance, return it
    /// 3. Filter to enabled, non-draining, non-open instances
    /// 4. Delegate to the service's algorithm
    /// 5. Count the request in flight and bind the affinity key
    pub fn select_instance_with(
        &self,
        service: &str,
        ctx: &SelectionContext,
    ) -> Result<Arc<ServiceInstance>> {
        let instances = self.registry.instances(service);
        if instances.is_empty() {
            warn!("No instances registered for service {}", service);
            return Err(BalancerError::no_eligible(service));
        }

        // 1. Lazy half-open
        let now = Instant::now();
        for instance in &instances {
            if instance.circuit_state() == CircuitState::Open {
                self.breaker.try_half_open(instance, now);
            }
        }

        // 2. Sticky binding
        let route = self.route(service);
        let affinity_key = ctx
            .affinity_key
            .as_deref()
            .filter(|_| route.affinity_enabled());

        if let Some(key) = affinity_key {
            let bound = self.affinity.get_if(service, key, |host| {
                instances
                    .iter()
                    .any(|i| i.host() == host && i.accepts_affinity())
            });
            if let Some(instance) = bound.and_then(|host| instances.iter().find(|i| i.host() == host)) {
                instance.acquire();
                debug!(
                    "Affinity hit for {} on {}: {}",
                    key,
                    service,
                    instance.host()
                );
                return Ok(instance.clone());
            }
        }

        // 3. Eligible set
        let eligible: Vec<&Arc<ServiceInstance>> =
            instances.iter().filter(|i| i.is_selectable()).collect();
        if eligible.is_empty() {
            warn!(
                "All {} instances of service {} are ineligible",
                instances.len(),
                service
            );
            return Err(BalancerError::no_eligible(service));
        }

        // 4. Algorithm
        let snapshots: Vec<InstanceSnapshot> = eligible.iter().map(|i| i.snapshot()).collect();
        let strategy = route.strategy();
        let index = strategy.select(&snapshots, ctx).map_err(|e| match e {
            BalancerError::NoEligibleInstances { .. } => BalancerError::no_eligible(service),
            other => other,
        })?;
        let instance = eligible
            .get(index)
            .copied()
            .cloned()
            .ok_or_else(|| BalancerError::no_eligible(service))?;

        // 5. Bookkeeping
        instance.acquire();
        if let Some(key) = affinity_key {
            self.affinity.set(service, key, instance.host(), None);
        }

        debug!(
            "Selected {} for service {} using {}",
            instance.host(),
            service,
            strategy.algorithm()
        );
        Ok(instance)
    }

    /// Report the outcome of a request forwarded to `host`
    ///
    /// Updates the health score and circuit breaker and releases the
    /// in-flight slot taken at selection. Reports for unknown instances are
    /// ignored.
    pub fn report_outcome(&self, service: &str, host: &str, success: bool, latency: Duration) {
        let Some(instance) = self.registry.find(service, host) else {
            debug!(
                "Ignoring outcome for unknown instance {} of service {}",
                host, service
            );
            return;
        };

        let transition = {
            let mut state = instance.state.write();
            self.scorer.record(&mut state, success, latency);
            self.breaker.on_outcome(host, &mut state, success)
        };
        instance.release();

        if let Some(transition) = transition {
            info!(
                "Instance {} of service {} circuit {} -> {}",
                host,
                service,
                transition.from.as_str(),
                transition.to.as_str()
            );
        }
    }
}
