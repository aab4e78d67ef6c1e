//! Live counters and the smoothed response-time average.

use serde::{Deserialize, Serialize};

/// Exponential moving average weights: `new = old * retain + sample * sample_weight`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothing {
    pub retain: f64,
    pub sample_weight: f64,
}

impl Smoothing {
    pub fn apply(&self, average: f64, sample: f64) -> f64 {
        average * self.retain + sample * self.sample_weight
    }
}

/// Smoothing used for background analytics samples.
pub const BACKGROUND_SMOOTHING: Smoothing = Smoothing {
    retain: 0.9,
    sample_weight: 0.1,
};

/// Smoothing used when a user-initiated call completes. Converges more
/// slowly than the background average.
pub const CALL_COMPLETION_SMOOTHING: Smoothing = Smoothing {
    retain: 0.95,
    sample_weight: 0.05,
};

/// Aggregate counters shown on the live dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMetrics {
    pub api_calls: u64,
    pub errors: u64,
    /// Smoothed latency in milliseconds.
    pub response_time: f64,
    pub active_users: usize,
}

impl LiveMetrics {
    /// Folds in a fabricated background sample.
    pub fn record_background_sample(&mut self, duration_ms: u64, is_error: bool) {
        self.record(duration_ms, is_error, BACKGROUND_SMOOTHING);
    }

    /// Folds in the terminal result of a user-initiated call.
    pub fn record_call_completion(&mut self, duration_ms: u64, is_error: bool) {
        self.record(duration_ms, is_error, CALL_COMPLETION_SMOOTHING);
    }

    fn record(&mut self, duration_ms: u64, is_error: bool, smoothing: Smoothing) {
        self.api_calls += 1;
        if is_error {
            self.errors += 1;
        }
        self.response_time = smoothing.apply(self.response_time, duration_ms as f64);
    }
}
