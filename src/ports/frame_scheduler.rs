//! FrameScheduler port - the "next rendering frame" primitive.
//!
//! The live preview coalesces mutations into one snapshot per frame. Any
//! mechanism giving deferred, single-shot execution satisfies the port; the
//! exact frame length is not part of the contract.

/// Work to run on the next frame.
pub type FrameCallback = Box<dyn FnOnce() + Send + 'static>;

/// Schedules callbacks on the next frame boundary.
pub trait FrameScheduler: Send + Sync {
    /// Runs `callback` once, at the next frame. Never runs it inline.
    fn request_frame(&self, callback: FrameCallback);
}
