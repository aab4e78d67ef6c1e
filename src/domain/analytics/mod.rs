//! Analytics domain - call records, live counters and rolling summaries.

mod call_log;
mod metrics;
mod summary;

pub use call_log::{
    ApiCallLog, CallLog, CallOutcome, CallStatus, HttpMethod, DEFAULT_LOG_CAPACITY,
};
pub use metrics::{LiveMetrics, Smoothing, BACKGROUND_SMOOTHING, CALL_COMPLETION_SMOOTHING};
pub use summary::{AnalyticsSummary, DEFAULT_WINDOW};
