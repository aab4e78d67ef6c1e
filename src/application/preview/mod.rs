//! Live preview synchronization.
//!
//! - `LivePreviewSynchronizer` - Frame-coalesced preview state and persistence
//! - `RemoteEditBridge` - Feeds remote component edits into the synchronizer

mod remote_edits;
mod synchronizer;

pub use remote_edits::RemoteEditBridge;
pub use synchronizer::{LivePreviewConfig, LivePreviewSynchronizer, Mutator, PreviewSnapshot};
