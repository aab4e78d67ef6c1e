//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the realtime core and the outside world. Adapters implement these ports.
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing bus events
//! - `EventSubscriber` - Port for subscribing to bus events
//! - `EventHandler` - Handler that processes delivered events
//!
//! ## Runtime Ports
//!
//! - `FrameScheduler` - Next-frame primitive used by the live preview
//! - `Clock` - Source of the current time
//! - `DurableStore` - Local key/value persistence

mod clock;
mod durable_store;
mod event_publisher;
mod event_subscriber;
mod frame_scheduler;

pub use clock::Clock;
pub use durable_store::{DurableStore, StorageError};
pub use event_publisher::EventPublisher;
pub use event_subscriber::{handler_fn, EventHandler, EventSubscriber, Subscription};
pub use frame_scheduler::{FrameCallback, FrameScheduler};
