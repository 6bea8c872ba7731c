//! Smoothed per-instance health scoring
//!
//! Every outcome produces an instantaneous signal in [0, 1]: a failure is 0,
//! a success is 1 scaled down by `baseline / latency` when slower than the
//! baseline. The score is an exponential moving average of that signal.

use super::instance::InstanceState;
use crate::config::HealthScoreConfig;
use std::time::Duration;

/// Smoothing constant for the average response time
const RESPONSE_TIME_ALPHA: f64 = 0.2;

/// Sole writer of health scores and outcome counters
#[derive(Debug, Clone)]
pub struct HealthScorer {
    alpha: f64,
    baseline_latency: Duration,
}

impl HealthScorer {
    pub fn new(config: &HealthScoreConfig) -> Self {
        Self {
            alpha: config.smoothing_alpha.clamp(f64::MIN_POSITIVE, 1.0),
            baseline_latency: config.baseline_latency(),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn baseline_latency(&self) -> Duration {
        self.baseline_latency
    }

    /// Signal contributed by a single outcome
    pub fn instant_signal(&self, success: bool, latency: Duration) -> f64 {
        if !success {
            return 0.0;
        }
        if latency.is_zero() || latency <= self.baseline_latency {
            return 1.0;
        }
        (self.baseline_latency.as_secs_f64() / latency.as_secs_f64()).min(1.0)
    }

    /// Fold one outcome into the instance state
    pub(crate) fn record(&self, state: &mut InstanceState, success: bool, latency: Duration) {
        state.total_requests += 1;
        state.last_response_time = latency;

        if success {
            state.success_requests += 1;
            state.consecutive_successes = state.consecutive_successes.saturating_add(1);
            state.consecutive_failures = 0;
            state.avg_response_time = if state.avg_response_time.is_zero() {
                latency
            } else {
                state
                    .avg_response_time
                    .mul_f64(1.0 - RESPONSE_TIME_ALPHA)
                    .saturating_add(latency.mul_f64(RESPONSE_TIME_ALPHA))
            };
        } else {
            state.failed_requests += 1;
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            state.consecutive_successes = 0;
        }

        let signal = self.instant_signal(success, latency);
        let score = (1.0 - self.alpha) * state.health_score + self.alpha * signal;
        state.health_score = score.clamp(0.0, 1.0);
    }
}

impl Default for HealthScorer {
    fn default() -> Self {
        Self::new(&HealthScoreConfig::default())
    }
}
