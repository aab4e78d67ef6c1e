//! EventSubscriber port - Interface for subscribing to bus events.
//!
//! This port defines how consumers register interest in named events
//! without knowing how the bus stores or delivers them.

use std::sync::Arc;

use crate::domain::events::Event;
use crate::domain::foundation::DomainError;

/// Handler invoked synchronously for every matching event.
///
/// Implementations should be:
/// - **Quick** - Delivery happens on the publisher's call stack
/// - **Isolated** - A returned error or panic is logged by the bus and
///   never reaches the publisher or other handlers
///
/// Handler identity is the `Arc` allocation: subscribing the same `Arc`
/// twice to one event type delivers once.
pub trait EventHandler: Send + Sync {
    /// Process an event.
    fn handle(&self, event: &Event) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Adapter turning a closure into an [`EventHandler`].
struct FnHandler<F> {
    name: &'static str,
    f: F,
}

impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&Event) -> Result<(), DomainError> + Send + Sync,
{
    fn handle(&self, event: &Event) -> Result<(), DomainError> {
        (self.f)(event)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Wraps a closure as a shareable handler.
///
/// # Example
///
/// ```ignore
/// let handler = handler_fn("tick_counter", move |_event| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// });
/// let sub = bus.subscribe("tick", handler);
/// ```
pub fn handler_fn<F>(name: &'static str, f: F) -> Arc<dyn EventHandler>
where
    F: Fn(&Event) -> Result<(), DomainError> + Send + Sync + 'static,
{
    Arc::new(FnHandler { name, f })
}

/// Token identifying one registration, used to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[must_use = "dropping the subscription token makes the handler impossible to unsubscribe"]
pub struct Subscription {
    pub(crate) event_type: String,
    pub(crate) id: u64,
}

impl Subscription {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Port for subscribing to bus events.
///
/// # Example
///
/// ```ignore
/// let sub = subscriber.subscribe("cursor_move", tracker);
/// subscriber.unsubscribe(&sub);
/// ```
pub trait EventSubscriber: Send + Sync {
    /// Subscribe handler to a specific event type.
    ///
    /// Returns the existing token if this handler is already registered
    /// for the type.
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) -> Subscription;

    /// Subscribe handler to multiple event types.
    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) -> Vec<Subscription> {
        event_types
            .iter()
            .map(|event_type| self.subscribe(event_type, Arc::clone(&handler)))
            .collect()
    }

    /// Removes a registration. Returns false if it was already gone.
    fn unsubscribe(&self, subscription: &Subscription) -> bool;
}
