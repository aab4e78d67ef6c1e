//! Domain layer containing the realtime core's types and pure logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors)
//! - `events` - Bus events and connection state
//! - `analytics` - Call log, live metrics and rolling summaries
//! - `collaboration` - Collaborator cursors and identity
//! - `preview` - Canvas components, preview state and export
//! - `traffic` - Weighted endpoint sampling for synthetic traffic

pub mod analytics;
pub mod collaboration;
pub mod events;
pub mod foundation;
pub mod preview;
pub mod traffic;
