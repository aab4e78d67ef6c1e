//! Storage Adapters
//!
//! Implementations of the DurableStore port.
//!
//! ## Available Adapters
//!
//! - **FileStore** - One file per key under a base directory
//! - **InMemoryStore** - Values held in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileStore, InMemoryStore};
//!
//! // Production: file-based storage
//! let store = FileStore::new("./data/store");
//!
//! // Testing: in-memory storage
//! let store = InMemoryStore::new();
//! ```

mod file_store;
mod in_memory_store;

pub use file_store::FileStore;
pub use in_memory_store::InMemoryStore;
