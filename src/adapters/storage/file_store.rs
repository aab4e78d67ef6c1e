//! File-based Durable Store Adapter
//!
//! Stores each key as one file under a base directory. Keys map directly to
//! file names, so only a conservative character set is accepted.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ports::{DurableStore, StorageError};

const VALUE_EXTENSION: &str = "json";

/// File-backed key/value store
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a new file store rooted at `base_path`
    ///
    /// The directory is created lazily on first write.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileStore::new("./data/store");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Root directory of the store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn value_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.base_path.join(format!("{key}.{VALUE_EXTENSION}")))
    }

    async fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))
    }
}

/// Keys are limited to ASCII alphanumerics, `-`, `_` and `.` (not leading).
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.value_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(e.to_string())),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.value_path(key)?;
        self.ensure_dir().await?;

        // Write beside the target then rename so readers never see a partial value
        let staging = path.with_extension(format!("{VALUE_EXTENSION}.tmp"));
        fs::write(&staging, value)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        tracing::trace!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(e.to_string())),
        }
    }
}
