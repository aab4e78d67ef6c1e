//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PAGESMITH` prefix and nested values use double underscores as separators.
//!
//! Every setting has a default, so an empty environment yields a runnable
//! configuration.
//!
//! # Example
//!
//! ```no_run
//! use pagesmith::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Analytics every {:?}", config.simulation.analytics_interval());
//! ```

mod analytics;
mod error;
mod logging;
mod preview;
mod simulation;

pub use analytics::AnalyticsConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use preview::PreviewConfig;
pub use simulation::SimulationConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Synthetic traffic cadence and error rates
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Live preview frame pacing and persistence
    #[serde(default)]
    pub preview: PreviewConfig,

    /// Analytics window and retention
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Tracing output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PAGESMITH` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PAGESMITH__SIMULATION__SEED=42` -> `simulation.seed = 42`
    /// - `PAGESMITH__PREVIEW__STORAGE_DIR=/tmp/ps` -> `preview.storage_dir = /tmp/ps`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAGESMITH")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for zero periods, probabilities outside
    /// `0.0..=1.0`, an empty log capacity or a malformed log filter.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.simulation.validate()?;
        self.preview.validate()?;
        self.analytics.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
