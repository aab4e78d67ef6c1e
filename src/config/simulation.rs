//! Synthetic traffic configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::{check_interval, check_probability, ValidationError};

/// Cadence, gates and error rates of the fabricated realtime traffic
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// Period of the analytics sample loop in milliseconds
    #[serde(default = "default_analytics_interval")]
    pub analytics_interval_ms: u64,

    /// Chance that an analytics tick produces a sample
    #[serde(default = "default_analytics_probability")]
    pub analytics_probability: f64,

    /// Period of the cursor movement loop in milliseconds
    #[serde(default = "default_collaboration_interval")]
    pub collaboration_interval_ms: u64,

    /// Chance that a collaboration tick moves a cursor
    #[serde(default = "default_collaboration_probability")]
    pub collaboration_probability: f64,

    /// Period of the join/leave loop in milliseconds
    #[serde(default = "default_presence_interval")]
    pub presence_interval_ms: u64,

    /// Chance that a presence tick changes membership
    #[serde(default = "default_presence_probability")]
    pub presence_probability: f64,

    /// Error probability for background samples
    #[serde(default = "default_background_error_rate")]
    pub background_error_rate: f64,

    /// Error probability for user-initiated calls
    #[serde(default = "default_user_error_rate")]
    pub user_error_rate: f64,

    /// Simulated handshake time in milliseconds
    #[serde(default = "default_connect_delay")]
    pub connect_delay_ms: u64,

    /// Chance that a connection attempt fails
    #[serde(default)]
    pub connect_failure_probability: f64,

    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn analytics_interval(&self) -> Duration {
        Duration::from_millis(self.analytics_interval_ms)
    }

    pub fn collaboration_interval(&self) -> Duration {
        Duration::from_millis(self.collaboration_interval_ms)
    }

    pub fn presence_interval(&self) -> Duration {
        Duration::from_millis(self.presence_interval_ms)
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }

    /// Validate simulation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_interval("simulation.analytics_interval_ms", self.analytics_interval_ms)?;
        check_interval("simulation.collaboration_interval_ms", self.collaboration_interval_ms)?;
        check_interval("simulation.presence_interval_ms", self.presence_interval_ms)?;
        check_probability("simulation.analytics_probability", self.analytics_probability)?;
        check_probability("simulation.collaboration_probability", self.collaboration_probability)?;
        check_probability("simulation.presence_probability", self.presence_probability)?;
        check_probability("simulation.background_error_rate", self.background_error_rate)?;
        check_probability("simulation.user_error_rate", self.user_error_rate)?;
        check_probability(
            "simulation.connect_failure_probability",
            self.connect_failure_probability,
        )?;
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            analytics_interval_ms: default_analytics_interval(),
            analytics_probability: default_analytics_probability(),
            collaboration_interval_ms: default_collaboration_interval(),
            collaboration_probability: default_collaboration_probability(),
            presence_interval_ms: default_presence_interval(),
            presence_probability: default_presence_probability(),
            background_error_rate: default_background_error_rate(),
            user_error_rate: default_user_error_rate(),
            connect_delay_ms: default_connect_delay(),
            connect_failure_probability: 0.0,
            seed: None,
        }
    }
}

fn default_analytics_interval() -> u64 {
    2_000
}

fn default_analytics_probability() -> f64 {
    0.7
}

fn default_collaboration_interval() -> u64 {
    3_000
}

fn default_collaboration_probability() -> f64 {
    0.4
}

fn default_presence_interval() -> u64 {
    5_000
}

fn default_presence_probability() -> f64 {
    0.2
}

fn default_background_error_rate() -> f64 {
    0.10
}

fn default_user_error_rate() -> f64 {
    0.05
}

fn default_connect_delay() -> u64 {
    1_000
}
