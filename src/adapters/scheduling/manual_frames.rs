//! Frame scheduler driven by hand, for deterministic tests.

use std::sync::{Mutex, PoisonError};

use crate::ports::{FrameCallback, FrameScheduler};

/// Queues frame requests until `run_frame` is called.
#[derive(Default)]
pub struct ManualFrameScheduler {
    queued: Mutex<Vec<FrameCallback>>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.queued.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Runs every callback queued before this call and returns how many ran.
    ///
    /// Callbacks requested while the frame runs wait for the next one.
    pub fn run_frame(&self) -> usize {
        let callbacks = std::mem::take(&mut *self.queued.lock().unwrap_or_else(PoisonError::into_inner));
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }
}
