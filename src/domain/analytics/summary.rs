//! Rolling-window statistics over the call log.
//!
//! Everything here is a read-only view, recomputed on demand.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::foundation::Timestamp;

use super::call_log::{ApiCallLog, CallStatus};

/// Default aggregation window (one hour).
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Summary statistics for the entries inside the window.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_calls: usize,
    /// Percentage in `[0, 100]`.
    pub success_rate: f64,
    /// Milliseconds.
    pub average_response_time: f64,
    pub error_count: usize,
    pub pending_count: usize,
    pub calls_by_endpoint: BTreeMap<String, usize>,
}

impl AnalyticsSummary {
    /// Aggregates the entries with `0 <= now - timestamp < window`.
    ///
    /// Entries stamped after `now` are outside the window.
    pub fn compute<'a, I>(entries: I, now: Timestamp, window: Duration) -> Self
    where
        I: IntoIterator<Item = &'a ApiCallLog>,
    {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        let mut summary = AnalyticsSummary::default();
        let mut success = 0usize;
        let mut total_duration = 0u64;

        for entry in entries {
            let age = now.millis_since(&entry.timestamp);
            if age < 0 || age >= window_ms {
                continue;
            }

            summary.total_calls += 1;
            total_duration = total_duration.saturating_add(entry.duration);
            match entry.status {
                CallStatus::Success => success += 1,
                CallStatus::Error => summary.error_count += 1,
                CallStatus::Pending => summary.pending_count += 1,
            }
            *summary
                .calls_by_endpoint
                .entry(entry.endpoint.clone())
                .or_default() += 1;
        }

        if summary.total_calls > 0 {
            let total = summary.total_calls as f64;
            summary.success_rate = success as f64 / total * 100.0;
            summary.average_response_time = total_duration as f64 / total;
        }

        summary
    }
}
