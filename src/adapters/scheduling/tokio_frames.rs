//! Frame scheduler backed by the tokio timer.
//!
//! Each requested frame is a spawned task that sleeps one frame interval
//! and then runs its callback. The live preview never has more than one
//! frame outstanding, so this stays at one short-lived task per frame.

use std::time::Duration;

use tokio::runtime::Handle;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{FrameCallback, FrameScheduler};

/// Roughly one display refresh at 60Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Schedules frame callbacks on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioFrameScheduler {
    handle: Handle,
    frame_interval: Duration,
}

impl TokioFrameScheduler {
    /// Binds to the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerUnavailable` when called outside a tokio runtime.
    pub fn current(frame_interval: Duration) -> Result<Self, DomainError> {
        let handle = Handle::try_current().map_err(|e| {
            DomainError::new(
                ErrorCode::SchedulerUnavailable,
                format!("no tokio runtime available for frame scheduling: {e}"),
            )
        })?;
        Ok(Self::with_handle(handle, frame_interval))
    }

    pub fn with_handle(handle: Handle, frame_interval: Duration) -> Self {
        Self {
            handle,
            frame_interval,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}

impl FrameScheduler for TokioFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) {
        let frame_interval = self.frame_interval;
        self.handle.spawn(async move {
            tokio::time::sleep(frame_interval).await;
            callback();
        });
    }
}
