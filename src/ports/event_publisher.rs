//! EventPublisher port - Interface for publishing bus events.

use serde_json::Value as JsonValue;

use crate::domain::events::{ConnectionState, Event};
use crate::domain::foundation::UserId;

/// Port for publishing events.
///
/// Delivery is synchronous, at-most-once and best-effort:
/// - every handler registered for the type when `publish` starts runs
///   before `publish` returns
/// - with no handlers the event is dropped
/// - handler failures never surface to the caller
pub trait EventPublisher: Send + Sync {
    /// Publish a pre-built event, returning how many handlers ran.
    fn publish(&self, event: Event) -> usize;

    /// Convenience: build and publish an event in one call.
    fn emit(&self, event_type: &str, payload: JsonValue, user_id: Option<UserId>) -> Event {
        let mut event = Event::new(event_type, payload);
        event.user_id = user_id;
        self.publish(event.clone());
        event
    }

    /// Current state of the simulated realtime connection.
    fn connection_state(&self) -> ConnectionState;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EventPublisher) {}

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn event_publisher_is_send_sync() {
        #[allow(dead_code)]
        fn check<T: EventPublisher>() {
            assert_send_sync::<T>();
        }
    }
}
