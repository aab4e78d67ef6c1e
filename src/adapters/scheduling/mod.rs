//! Frame scheduler adapters.
//!
//! - `TokioFrameScheduler` - Timer-driven frames on a tokio runtime
//! - `ManualFrameScheduler` - Frames advanced explicitly by tests

mod manual_frames;
mod tokio_frames;

pub use manual_frames::ManualFrameScheduler;
pub use tokio_frames::{TokioFrameScheduler, DEFAULT_FRAME_INTERVAL};
