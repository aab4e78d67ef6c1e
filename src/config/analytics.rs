//! Analytics configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::{check_interval, ValidationError};

/// Window, retention and reporting for the analytics view
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnalyticsConfig {
    /// Summary window in seconds
    #[serde(default = "default_window")]
    pub window_secs: u64,

    /// Maximum retained call log entries
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Seconds before an idle collaborator cursor is dropped
    #[serde(default = "default_cursor_ttl")]
    pub cursor_ttl_secs: u64,

    /// How often the binary logs a summary, in seconds
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

impl AnalyticsConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn cursor_ttl(&self) -> Duration {
        Duration::from_secs(self.cursor_ttl_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    /// Validate analytics configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_interval("analytics.window_secs", self.window_secs)?;
        check_interval("analytics.cursor_ttl_secs", self.cursor_ttl_secs)?;
        check_interval("analytics.report_interval_secs", self.report_interval_secs)?;
        if self.log_capacity == 0 {
            return Err(ValidationError::InvalidLogCapacity);
        }
        Ok(())
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window(),
            log_capacity: default_log_capacity(),
            cursor_ttl_secs: default_cursor_ttl(),
            report_interval_secs: default_report_interval(),
        }
    }
}

fn default_window() -> u64 {
    3_600
}

fn default_log_capacity() -> usize {
    100
}

fn default_cursor_ttl() -> u64 {
    30
}

fn default_report_interval() -> u64 {
    10
}
