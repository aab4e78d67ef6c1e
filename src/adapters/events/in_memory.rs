//! In-memory event bus.
//!
//! Provides synchronous, same-call delivery to handlers registered per
//! event type. One instance is constructed by the application root and
//! shared as `Arc<InMemoryEventBus>`; tests build one per fixture.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::json;

use crate::domain::events::{ConnectionState, Event, EVENT_CONNECTION};
use crate::domain::foundation::Timestamp;
use crate::ports::{EventHandler, EventPublisher, EventSubscriber, Subscription};

struct Registration {
    id: u64,
    handler: Arc<dyn EventHandler>,
}

/// In-memory publish/subscribe hub keyed by event type.
///
/// Features:
/// - Synchronous fan-out: every handler registered when `publish` starts
///   runs before it returns
/// - Set semantics per event type (the same `Arc` registers once)
/// - Handler errors and panics are logged and isolated
/// - Empty event types are removed on last unsubscribe
///
/// Locks are released before handlers run, so handlers may publish,
/// subscribe or unsubscribe re-entrantly.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// let sub = bus.subscribe("tick", handler_fn("ticker", |_| Ok(())));
/// bus.emit("tick", json!({}), None);
/// bus.unsubscribe(&sub);
/// ```
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<String, Vec<Registration>>>,
    next_id: AtomicU64,
    connection: RwLock<ConnectionState>,
}

impl InMemoryEventBus {
    /// Creates a new empty event bus in the `disconnected` state.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            connection: RwLock::new(ConnectionState::Disconnected),
        }
    }

    fn handlers_read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Registration>>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn handlers_write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Registration>>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of handlers registered for a type.
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.handlers_read().get(event_type).map(Vec::len).unwrap_or(0)
    }

    /// Event types with at least one handler, sorted.
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers_read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Removes every registration. Safe to call repeatedly.
    pub fn clear(&self) {
        let removed: usize = {
            let mut handlers = self.handlers_write();
            let count = handlers.values().map(Vec::len).sum();
            handlers.clear();
            count
        };
        if removed > 0 {
            tracing::debug!(removed, "event bus cleared");
        }
    }

    /// Records a connection state change and announces it on the bus,
    /// stamped with `at`.
    ///
    /// Returns false when the state was already current.
    pub fn set_connection_state(&self, state: ConnectionState, at: Timestamp) -> bool {
        let previous = {
            let mut current = self.connection.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, state)
        };
        if previous == state {
            return false;
        }

        tracing::debug!(from = %previous, to = %state, "connection state changed");
        self.publish(
            Event::new(EVENT_CONNECTION, json!({ "state": state, "previous": previous })).at(at),
        );
        true
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: Event) -> usize {
        // Snapshot handlers so none of our locks are held during delivery
        let type_handlers: Vec<Arc<dyn EventHandler>> = self
            .handlers_read()
            .get(&event.event_type)
            .map(|regs| regs.iter().map(|r| Arc::clone(&r.handler)).collect())
            .unwrap_or_default();

        if type_handlers.is_empty() {
            tracing::trace!(event_type = %event.event_type, "no subscribers, event dropped");
            return 0;
        }

        for handler in &type_handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(
                        handler = handler.name(),
                        event_type = %event.event_type,
                        error = %e,
                        "event handler failed"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        handler = handler.name(),
                        event_type = %event.event_type,
                        "event handler panicked"
                    );
                }
            }
        }

        type_handlers.len()
    }

    fn connection_state(&self) -> ConnectionState {
        *self.connection.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) -> Subscription {
        let mut handlers = self.handlers_write();
        let registrations = handlers.entry(event_type.to_string()).or_default();

        let handler_addr = Arc::as_ptr(&handler) as *const ();
        if let Some(existing) = registrations
            .iter()
            .find(|r| Arc::as_ptr(&r.handler) as *const () == handler_addr)
        {
            return Subscription {
                event_type: event_type.to_string(),
                id: existing.id,
            };
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        registrations.push(Registration { id, handler });
        Subscription {
            event_type: event_type.to_string(),
            id,
        }
    }

    fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut handlers = self.handlers_write();
        let Some(registrations) = handlers.get_mut(&subscription.event_type) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|r| r.id != subscription.id);
        let removed = registrations.len() != before;

        if registrations.is_empty() {
            handlers.remove(&subscription.event_type);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::ports::handler_fn;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn counting_handler(name: &'static str, counter: Arc<AtomicUsize>) -> Arc<dyn EventHandler> {
        handler_fn(name, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn publish_without_subscribers_is_a_silent_drop() {
        let bus = InMemoryEventBus::new();

        for _ in 0..3 {
            assert_eq!(bus.publish(Event::new("x", json!({}))), 0);
        }
        assert!(bus.event_types().is_empty());
    }

    #[test]
    fn both_subscribers_receive_one_publish_once() {
        let bus = InMemoryEventBus::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let _sa = bus.subscribe("tick", counting_handler("a", a.clone()));
        let _sb = bus.subscribe("tick", counting_handler("b", b.clone()));

        assert_eq!(bus.publish(Event::new("tick", json!(1))), 2);

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribers_of_other_types_receive_nothing() {
        let bus = InMemoryEventBus::new();
        let other = Arc::new(AtomicUsize::new(0));
        let _sub = bus.subscribe("tock", counting_handler("other", other.clone()));

        bus.publish(Event::new("tick", json!(null)));

        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handler_receives_the_published_payload() {
        let bus = InMemoryEventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = bus.subscribe(
            "tick",
            handler_fn("recorder", move |event| {
                sink.lock().unwrap().push(event.payload.clone());
                Ok(())
            }),
        );

        bus.emit("tick", json!({"n": 3}), None);

        assert_eq!(*seen.lock().unwrap(), vec![json!({"n": 3})]);
    }

    #[test]
    fn duplicate_registration_delivers_once() {
        let bus = InMemoryEventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler("dup", count.clone());

        let first = bus.subscribe("tick", handler.clone());
        let second = bus.subscribe("tick", handler);
        bus.publish(Event::new("tick", json!(null)));

        assert_eq!(first, second);
        assert_eq!(bus.subscriber_count("tick"), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery_and_frees_empty_type() {
        let bus = InMemoryEventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sub = bus.subscribe("tick", counting_handler("c", count.clone()));

        bus.publish(Event::new("tick", json!(null)));
        assert!(bus.unsubscribe(&sub));
        bus.publish(Event::new("tick", json!(null)));
        bus.publish(Event::new("tick", json!(null)));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(bus.event_types().is_empty());
        assert!(!bus.unsubscribe(&sub));
    }

    #[test]
    fn failing_and_panicking_handlers_do_not_block_others() {
        let bus = InMemoryEventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let _fail = bus.subscribe(
            "tick",
            handler_fn("fails", |_| Err(DomainError::new(ErrorCode::HandlerFailed, "boom"))),
        );
        let _panic = bus.subscribe("tick", handler_fn("panics", |_| panic!("handler panic")));
        let _ok = bus.subscribe("tick", counting_handler("ok", count.clone()));

        let delivered = bus.publish(Event::new("tick", json!(null)));

        assert_eq!(delivered, 3);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handlers_may_unsubscribe_reentrantly() {
        let bus = Arc::new(InMemoryEventBus::new());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let count = Arc::new(AtomicUsize::new(0));

        let bus_ref = Arc::downgrade(&bus);
        let slot_ref = slot.clone();
        let counter = count.clone();
        let sub = bus.subscribe(
            "once",
            handler_fn("once", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                if let (Some(bus), Some(sub)) = (bus_ref.upgrade(), slot_ref.lock().unwrap().take()) {
                    bus.unsubscribe(&sub);
                }
                Ok(())
            }),
        );
        *slot.lock().unwrap() = Some(sub);

        bus.publish(Event::new("once", json!(null)));
        bus.publish(Event::new("once", json!(null)));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let bus = InMemoryEventBus::new();
        let _a = bus.subscribe("a", handler_fn("a", |_| Ok(())));
        let _b = bus.subscribe("b", handler_fn("b", |_| Ok(())));

        bus.clear();
        bus.clear();

        assert!(bus.event_types().is_empty());
    }

    #[test]
    fn connection_changes_are_announced_once() {
        let bus = InMemoryEventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = bus.subscribe(
            EVENT_CONNECTION,
            handler_fn("conn", move |event| {
                sink.lock()
                    .unwrap()
                    .push((event.payload["state"].clone(), event.timestamp.as_millis()));
                Ok(())
            }),
        );

        assert_eq!(bus.connection_state(), ConnectionState::Disconnected);
        assert!(bus.set_connection_state(ConnectionState::Connecting, Timestamp::from_millis(10)));
        assert!(bus.set_connection_state(ConnectionState::Connected, Timestamp::from_millis(20)));
        assert!(!bus.set_connection_state(ConnectionState::Connected, Timestamp::from_millis(30)));

        assert_eq!(bus.connection_state(), ConnectionState::Connected);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(json!("connecting"), 10), (json!("connected"), 20)]
        );
    }
}
