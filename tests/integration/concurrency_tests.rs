//! Concurrency tests
//!
//! Many threads selecting and reporting at once must leave the balancer in a
//! consistent state.

#[cfg(test)]
mod tests {
    use crate::common::ServiceFixture;
    use crate::common::fixtures::SERVICE;
    use gateway_balancer::{Algorithm, InstanceSpec};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;
    use std::time::Duration;

    const THREADS: usize = 8;
    const PER_THREAD: usize = 500;

    /// Every selection is matched by a report, so in-flight counts return to zero
    #[test]
    fn test_concurrent_select_and_report() {
        for algorithm in Algorithm::ALL {
            let manager = Arc::new(
                ServiceFixture::new(algorithm)
                    .instance("a:80")
                    .instance("b:80")
                    .instance("c:80")
                    .build(),
            );
            let served = Arc::new(AtomicU64::new(0));

            let handles: Vec<_> = (0..THREADS)
                .map(|t| {
                    let manager = Arc::clone(&manager);
                    let served = Arc::clone(&served);
                    thread::spawn(move || {
                        for i in 0..PER_THREAD {
                            let key = format!("t{}-{}", t, i % 10);
                            // Failures may open circuits; a rejected selection is not served
                            let Ok(instance) = manager.select_instance(SERVICE, &key) else {
                                continue;
                            };
                            served.fetch_add(1, Ordering::Relaxed);
                            let success = (i + t) % 7 != 0;
                            manager.report_outcome(
                                SERVICE,
                                instance.host(),
                                success,
                                Duration::from_millis((i % 40) as u64 + 1),
                            );
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let stats = manager.get_stats(SERVICE);
            assert_eq!(stats.active_connections, 0, "{} leaked connections", algorithm);
            assert_eq!(
                stats.total_requests,
                served.load(Ordering::Relaxed),
                "{} lost reports",
                algorithm
            );
            assert!(served.load(Ordering::Relaxed) > 0);
            for instance in &stats.instances {
                assert!((0.0..=1.0).contains(&instance.health_score));
                assert!((0.0..=1.0).contains(&instance.recovery_weight));
                assert_eq!(
                    instance.success_requests + instance.failed_requests,
                    instance.total_requests
                );
            }
        }
    }

    /// Discovery churn during selection never yields an unregistered host
    #[test]
    fn test_selection_during_registry_churn() {
        let manager = Arc::new(
            ServiceFixture::new(Algorithm::RoundRobin)
                .instance("stable:80")
                .with_affinity(Duration::from_secs(60))
                .build(),
        );

        let churn = {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..200 {
                    let host = format!("dyn-{}:80", i % 5);
                    manager.upsert_instance(SERVICE, InstanceSpec::new(host.as_str()));
                    manager.remove_instance(SERVICE, &host);
                }
            })
        };

        let selectors: Vec<_> = (0..4)
            .map(|t| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    for i in 0..500 {
                        let key = format!("s{}-{}", t, i % 3);
                        let instance = manager.select_instance(SERVICE, &key).unwrap();
                        manager.report_outcome(
                            SERVICE,
                            instance.host(),
                            true,
                            Duration::from_millis(2),
                        );
                    }
                })
            })
            .collect();

        churn.join().unwrap();
        for handle in selectors {
            handle.join().unwrap();
        }

        let hosts: Vec<String> = manager
            .list_instances(SERVICE)
            .into_iter()
            .map(|i| i.host)
            .collect();
        assert_eq!(hosts, vec!["stable:80".to_string()]);
        for t in 0..4 {
            for i in 0..3 {
                let key = format!("s{}-{}", t, i);
                let instance = manager.select_instance(SERVICE, &key).unwrap();
                assert_eq!(instance.host(), "stable:80");
            }
        }
    }

    /// Algorithm switches racing with selection always leave a known algorithm
    #[test]
    fn test_algorithm_switch_under_load() {
        let manager = Arc::new(
            ServiceFixture::new(Algorithm::Adaptive)
                .instance("a:80")
                .instance("b:80")
                .build(),
        );

        let switcher = {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for (i, algorithm) in Algorithm::ALL.iter().cycle().take(100).enumerate() {
                    manager.set_algorithm(SERVICE, algorithm.as_str()).unwrap();
                    if i % 10 == 0 {
                        assert!(manager.set_algorithm(SERVICE, "nope").is_err());
                    }
                }
            })
        };

        let selector = {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    let instance = manager.select_instance(SERVICE, "").unwrap();
                    manager.report_outcome(SERVICE, instance.host(), true, Duration::from_millis(1));
                }
            })
        };

        switcher.join().unwrap();
        selector.join().unwrap();
        assert_eq!(manager.get_stats(SERVICE).active_connections, 0);
        assert!(Algorithm::ALL.contains(&manager.algorithm(SERVICE)));
    }
}
