//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Interval must be greater than zero: {0}")]
    ZeroInterval(&'static str),

    #[error("Probability must be within 0.0..=1.0: {0}")]
    InvalidProbability(&'static str),

    #[error("Call log capacity must be at least 1")]
    InvalidLogCapacity,

    #[error("Invalid log filter directive: {0}")]
    InvalidLogLevel(String),
}

/// Checks that `value` is a usable probability.
pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidProbability(name))
    }
}

/// Checks that a period or timeout is non-zero.
pub(crate) fn check_interval(name: &'static str, value: u64) -> Result<(), ValidationError> {
    if value == 0 {
        Err(ValidationError::ZeroInterval(name))
    } else {
        Ok(())
    }
}
