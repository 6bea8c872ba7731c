//! Selection property tests
//!
//! Fairness, weighting, exclusion, recovery and affinity as seen by a proxy.

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{SERVICE, report_many};
    use crate::common::{ServiceFixture, selection_counts};
    use crate::{assert_approx_eq, assert_share_between};
    use gateway_balancer::{Algorithm, BalancerError, CircuitState, SelectionContext};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Round robin serves N instances equally over any multiple of N selections
    #[test]
    fn test_round_robin_fairness() {
        let manager = ServiceFixture::new(Algorithm::RoundRobin)
            .instance("a:80")
            .instance("b:80")
            .instance("c:80")
            .instance("d:80")
            .build();

        let counts = selection_counts(&manager, 400);
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|c| *c == 100));
    }

    /// Weights 3:1 yield exactly 300:100 over 400 selections
    #[test]
    fn test_weighted_round_robin_ratio() {
        let manager = ServiceFixture::new(Algorithm::WeightedRoundRobin)
            .weighted("a:80", 3)
            .weighted("b:80", 1)
            .build();

        let counts = selection_counts(&manager, 400);
        assert_eq!(counts["a:80"], 300);
        assert_eq!(counts["b:80"], 100);
    }

    /// After five consecutive failures the instance receives no traffic
    #[test]
    fn test_failing_instance_excluded() {
        let manager = ServiceFixture::new(Algorithm::HealthAware)
            .instance("a:80")
            .instance("b:80")
            .build();
        report_many(&manager, "a:80", 5, false, Duration::from_millis(10));

        let counts = selection_counts(&manager, 200);
        assert_eq!(counts.get("a:80"), None);
        assert_eq!(counts["b:80"], 200);
    }

    /// No instances at all is a 503-class error
    #[test]
    fn test_no_eligible_instances() {
        let manager = ServiceFixture::new(Algorithm::Adaptive)
            .instance("a:80")
            .build();
        manager.disable_instance(SERVICE, "a:80").unwrap();

        let err = manager.select_instance(SERVICE, "").unwrap_err();
        assert!(matches!(err, BalancerError::NoEligibleInstances { .. }));
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.error_code(), "NO_ELIGIBLE_INSTANCES");
    }

    /// Fast instance wins most HealthAware selections after latency is observed
    #[test]
    fn test_health_aware_prefers_low_latency() {
        let manager = ServiceFixture::new(Algorithm::HealthAware)
            .weighted("a:80", 100)
            .weighted("b:80", 100)
            .build();
        report_many(&manager, "a:80", 50, true, Duration::from_millis(10));
        report_many(&manager, "b:80", 50, true, Duration::from_millis(200));

        let a = manager.get_instance(SERVICE, "a:80").unwrap();
        let b = manager.get_instance(SERVICE, "b:80").unwrap();
        assert_approx_eq!(a.health_score, 1.0);
        assert!(b.health_score < 0.3);

        let total = 4_000;
        let mut picked_a = 0;
        for _ in 0..total {
            if manager.select_instance(SERVICE, "").unwrap().host() == "a:80" {
                picked_a += 1;
            }
        }
        assert_share_between!(picked_a, total, 0.70, 1.0);
    }

    /// Adaptive (the default) sends everything to the faster of two healthy instances
    #[test]
    fn test_adaptive_prefers_low_latency() {
        let manager = ServiceFixture::new(Algorithm::Adaptive)
            .instance("a:80")
            .instance("b:80")
            .build();
        report_many(&manager, "a:80", 20, true, Duration::from_millis(10));
        report_many(&manager, "b:80", 20, true, Duration::from_millis(200));

        for _ in 0..20 {
            let instance = manager.select_instance(SERVICE, "").unwrap();
            assert_eq!(instance.host(), "a:80");
        }
    }

    /// Sticky sessions keep returning the same host while it stays eligible
    #[test]
    fn test_affinity_stickiness() {
        let manager = ServiceFixture::new(Algorithm::RoundRobin)
            .instance("a:80")
            .instance("b:80")
            .instance("c:80")
            .with_affinity(Duration::from_secs(60))
            .build();

        let mut bound: HashMap<String, String> = HashMap::new();
        for round in 0..5 {
            for user in 0..6 {
                let key = format!("user-{}", user);
                let instance = manager.select_instance(SERVICE, &key).unwrap();
                let host = bound.entry(key).or_insert_with(|| instance.host().to_string());
                assert_eq!(host, instance.host(), "round {} moved user {}", round, user);
                manager.report_outcome(SERVICE, instance.host(), true, Duration::from_millis(5));
            }
        }
        assert_eq!(manager.affinity_entries(SERVICE).len(), 6);
    }

    /// Draining lets bound sessions finish while new sessions go elsewhere
    #[test]
    fn test_drain_with_affinity() {
        let manager = ServiceFixture::new(Algorithm::LeastConnections)
            .instance("a:80")
            .instance("b:80")
            .with_affinity(Duration::from_secs(60))
            .build();

        let bound = manager.select_instance(SERVICE, "cart-1").unwrap();
        assert_eq!(bound.host(), "a:80");
        manager.drain_instance(SERVICE, "a:80").unwrap();

        assert_eq!(manager.select_instance(SERVICE, "cart-1").unwrap().host(), "a:80");
        assert_eq!(manager.select_instance(SERVICE, "cart-2").unwrap().host(), "b:80");
        assert_eq!(manager.select_instance(SERVICE, "").unwrap().host(), "b:80");

        let stats = manager.get_stats(SERVICE);
        assert_eq!(stats.draining_instances, 1);
        assert_eq!(stats.eligible_instances, 1);
    }

    /// A recovered instance ramps from the half-open weight back to full
    #[test]
    fn test_recovery_ramp_is_monotonic() {
        let manager = ServiceFixture::new(Algorithm::WeightedRoundRobin)
            .instance("a:80")
            .instance("b:80")
            .with_cooldown(Duration::from_millis(10))
            .build();
        report_many(&manager, "a:80", 5, false, Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));

        let mut weights = Vec::new();
        for _ in 0..12 {
            manager.recovery_tick();
            weights.push(manager.get_instance(SERVICE, "a:80").unwrap().recovery_weight);
        }

        assert_approx_eq!(weights[0], 0.1);
        assert!(weights.windows(2).all(|w| w[1] >= w[0]));
        assert_approx_eq!(*weights.last().unwrap(), 1.0);
        assert_eq!(
            manager.get_instance(SERVICE, "a:80").unwrap().circuit_state,
            CircuitState::Closed
        );
    }

    /// Consistent hashing keeps a client on one host across instance churn elsewhere
    #[test]
    fn test_consistent_hash_survives_unrelated_removal() {
        let manager = ServiceFixture::new(Algorithm::ConsistentHash)
            .instance("a:80")
            .instance("b:80")
            .instance("c:80")
            .instance("d:80")
            .build();

        let keys: Vec<String> = (0..100).map(|i| format!("client-{}", i)).collect();
        let before: Vec<String> = keys
            .iter()
            .map(|k| {
                let ctx = SelectionContext::new().with_affinity_key(k.as_str());
                manager.select_instance_with(SERVICE, &ctx).unwrap().host().to_string()
            })
            .collect();

        manager.remove_instance(SERVICE, "d:80");

        for (key, host) in keys.iter().zip(&before) {
            if host == "d:80" {
                continue;
            }
            let ctx = SelectionContext::new().with_affinity_key(key.as_str());
            let after = manager.select_instance_with(SERVICE, &ctx).unwrap();
            assert_eq!(after.host(), host);
        }
    }

    /// Switching algorithms at runtime is reflected in stats; bad names change nothing
    #[test]
    fn test_runtime_algorithm_switch() {
        let manager = ServiceFixture::new(Algorithm::Adaptive)
            .instance("a:80")
            .build();

        manager.set_algorithm(SERVICE, "round-robin").unwrap();
        assert_eq!(manager.get_stats(SERVICE).algorithm, Algorithm::RoundRobin);

        let err = manager.set_algorithm(SERVICE, "banana").unwrap_err();
        assert!(matches!(err, BalancerError::UnknownAlgorithm(_)));
        assert_eq!(manager.algorithm(SERVICE), Algorithm::RoundRobin);
    }
}
