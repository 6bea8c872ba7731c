//! Background recovery and affinity sweeping
//!
//! Tasks hold a `Weak` reference to the manager and exit on their own once
//! the manager is dropped.

use super::manager::LoadBalancerManager;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to the background tasks; dropping it stops them
#[derive(Debug)]
pub struct MaintenanceHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl MaintenanceHandle {
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Stop all background tasks
    pub fn shutdown(mut self) {
        self.abort_all();
        info!("Load balancer maintenance stopped");
    }

    fn abort_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.abort_all();
    }
}

impl LoadBalancerManager {
    /// Spawn the recovery and affinity sweep loops on the current runtime
    pub fn start_maintenance(self: &Arc<Self>) -> MaintenanceHandle {
        let recovery_interval = self.recovery.interval();
        let sweep_interval = self.config.affinity.sweep_interval();

        let recovery = spawn_periodic(Arc::downgrade(self), recovery_interval, |manager| {
            let report = manager.recovery_tick();
            if !report.is_empty() {
                debug!(
                    "Recovery tick: {} promoted, {} ramped, {} closed",
                    report.promoted.len(),
                    report.ramped.len(),
                    report.closed.len()
                );
            }
        });
        let sweep = spawn_periodic(Arc::downgrade(self), sweep_interval, |manager| {
            manager.sweep_affinity();
        });

        info!(
            "Load balancer maintenance started (recovery every {:?}, affinity sweep every {:?})",
            recovery_interval, sweep_interval
        );
        MaintenanceHandle {
            tasks: vec![recovery, sweep],
        }
    }
}

fn spawn_periodic<F>(manager: Weak<LoadBalancerManager>, period: Duration, job: F) -> JoinHandle<()>
where
    F: Fn(&LoadBalancerManager) + Send + 'static,
{
    // tokio rejects a zero period
    let period = period.max(MIN_PERIOD);
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(manager) = manager.upgrade() else {
                debug!("Load balancer dropped, stopping maintenance task");
                break;
            };
            job(manager.as_ref());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BalancerConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_zero_period_still_runs() {
        let manager = Arc::new(LoadBalancerManager::new(BalancerConfig::default()).unwrap());
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let task = spawn_periodic(Arc::downgrade(&manager), Duration::ZERO, move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(!task.is_finished());
        assert!(runs.load(Ordering::Relaxed) > 0);
        task.abort();
    }
}
