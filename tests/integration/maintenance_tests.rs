//! Background maintenance tests
//!
//! These run the real recovery and sweep loops with short periods.

#[cfg(test)]
mod tests {
    use crate::common::ServiceFixture;
    use crate::common::fixtures::{SERVICE, report_many};
    use gateway_balancer::{Algorithm, CircuitState};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{Instant, sleep};

    const DEADLINE: Duration = Duration::from_secs(5);

    /// A tripped instance is promoted and ramped back to closed without traffic
    #[tokio::test]
    async fn test_maintenance_recovers_open_instance() {
        let manager = Arc::new(
            ServiceFixture::new(Algorithm::RoundRobin)
                .instance("a:80")
                .instance("b:80")
                .with_cooldown(Duration::from_millis(20))
                .with_recovery_interval(Duration::from_millis(10))
                .build(),
        );
        report_many(&manager, "a:80", 5, false, Duration::from_millis(5));
        assert_eq!(
            manager.get_instance(SERVICE, "a:80").unwrap().circuit_state,
            CircuitState::Open
        );

        let handle = manager.start_maintenance();
        assert!(handle.is_running());

        let started = Instant::now();
        let mut previous = 0.0;
        let mut saw_half_open = false;
        loop {
            let stats = manager.get_instance(SERVICE, "a:80").unwrap();
            assert!(
                stats.recovery_weight >= previous,
                "recovery weight fell from {} to {}",
                previous,
                stats.recovery_weight
            );
            previous = stats.recovery_weight;
            saw_half_open |= stats.circuit_state == CircuitState::HalfOpen;

            if stats.circuit_state == CircuitState::Closed {
                break;
            }
            assert!(started.elapsed() < DEADLINE, "instance never recovered");
            sleep(Duration::from_millis(2)).await;
        }

        assert!(saw_half_open);
        assert_eq!(previous, 1.0);
        handle.shutdown();
    }

    /// Expired bindings are swept even when nobody looks them up
    #[tokio::test]
    async fn test_maintenance_sweeps_affinity() {
        let manager = Arc::new(
            ServiceFixture::new(Algorithm::RoundRobin)
                .instance("a:80")
                .with_affinity(Duration::from_millis(20))
                .with_sweep_interval(Duration::from_millis(10))
                .build(),
        );
        for i in 0..5 {
            manager.select_instance(SERVICE, &format!("user-{}", i)).unwrap();
        }
        assert_eq!(manager.affinity_table().len(), 5);

        let _handle = manager.start_maintenance();

        let started = Instant::now();
        while !manager.affinity_table().is_empty() {
            assert!(started.elapsed() < DEADLINE, "bindings were never swept");
            sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_recovery() {
        let manager = Arc::new(
            ServiceFixture::new(Algorithm::RoundRobin)
                .instance("a:80")
                .with_cooldown(Duration::from_millis(10))
                .with_recovery_interval(Duration::from_millis(10))
                .build(),
        );

        manager.start_maintenance().shutdown();
        report_many(&manager, "a:80", 5, false, Duration::from_millis(5));
        sleep(Duration::from_millis(100)).await;

        assert_eq!(
            manager.get_instance(SERVICE, "a:80").unwrap().circuit_state,
            CircuitState::Open
        );
    }

    /// Tasks exit on their own once the manager is gone
    #[tokio::test]
    async fn test_tasks_stop_when_manager_dropped() {
        let manager = Arc::new(
            ServiceFixture::new(Algorithm::Adaptive)
                .instance("a:80")
                .with_recovery_interval(Duration::from_millis(10))
                .with_sweep_interval(Duration::from_millis(10))
                .build(),
        );
        let handle = manager.start_maintenance();
        drop(manager);

        let started = Instant::now();
        while handle.is_running() {
            assert!(started.elapsed() < DEADLINE, "tasks outlived the manager");
            sleep(Duration::from_millis(5)).await;
        }
    }
}
