//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the realtime core to its runtime environment:
//! - `events` - Event bus implementation
//! - `scheduling` - Frame schedulers (tokio timer, manual)
//! - `storage` - Durable key/value stores (file, in-memory)
//! - `clock` - System and manual clocks

pub mod clock;
pub mod events;
pub mod scheduling;
pub mod storage;

pub use clock::{ManualClock, SystemClock};
pub use events::InMemoryEventBus;
pub use scheduling::{ManualFrameScheduler, TokioFrameScheduler, DEFAULT_FRAME_INTERVAL};
pub use storage::{FileStore, InMemoryStore};
