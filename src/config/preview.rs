//! Live preview configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::{check_interval, ValidationError};

/// Frame pacing, persistence cadence and storage location
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PreviewConfig {
    /// Frame length in milliseconds
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// How often the live state is saved, in milliseconds
    #[serde(default = "default_persist_interval")]
    pub persist_interval_ms: u64,

    /// How long a pending-update marker stays visible, in milliseconds
    #[serde(default = "default_pending_update_ttl")]
    pub pending_update_ttl_ms: u64,

    /// Directory for the durable store
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
}

impl PreviewConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn persist_interval(&self) -> Duration {
        Duration::from_millis(self.persist_interval_ms)
    }

    pub fn pending_update_ttl(&self) -> Duration {
        Duration::from_millis(self.pending_update_ttl_ms)
    }

    /// Validate preview configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_interval("preview.frame_interval_ms", self.frame_interval_ms)?;
        check_interval("preview.persist_interval_ms", self.persist_interval_ms)?;
        if self.storage_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("preview.storage_dir"));
        }
        Ok(())
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
            persist_interval_ms: default_persist_interval(),
            pending_update_ttl_ms: default_pending_update_ttl(),
            storage_dir: default_storage_dir(),
        }
    }
}

fn default_frame_interval() -> u64 {
    16
}

fn default_persist_interval() -> u64 {
    5_000
}

fn default_pending_update_ttl() -> u64 {
    300
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./data/pagesmith")
}
