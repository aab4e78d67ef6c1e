//! Durable Store Port - Interface for local key/value persistence.
//!
//! Mirrors browser local storage: string values under string keys. Callers
//! own the value format.

use async_trait::async_trait;

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to serialize value: {0}")]
    SerializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Port for persisting string values by key
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Load the value stored under `key`
    ///
    /// # Returns
    /// `None` if nothing is stored under the key
    ///
    /// # Errors
    /// Returns `StorageError` if the backing medium fails
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    /// Returns `StorageError` if the write fails
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value under `key`; removing a missing key is not an error
    ///
    /// # Errors
    /// Returns `StorageError` if the removal fails
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
