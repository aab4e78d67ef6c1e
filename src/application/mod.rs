//! Application layer - services that drive the realtime core.
//!
//! Services orchestrate domain types and coordinate between ports:
//! - `TrafficSimulator` - Synthetic analytics, cursor and presence traffic
//! - `RealtimeService` - Connection lifecycle gating the traffic
//! - `LivePreviewSynchronizer` - Frame-coalesced preview state
//! - `CollaborationTracker` - Remote cursors and presence

pub mod collaboration;
pub mod preview;
pub mod realtime;
pub mod traffic;

pub use collaboration::{CollaborationTracker, COLLABORATION_EVENT_TYPES};
pub use preview::{
    LivePreviewConfig, LivePreviewSynchronizer, Mutator, PreviewSnapshot, RemoteEditBridge,
};
pub use realtime::{RealtimeConfig, RealtimeService};
pub use traffic::{TrafficSimulator, TrafficSimulatorConfig};
