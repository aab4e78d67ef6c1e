//! Realtime events carried on the event bus.
//!
//! An [`Event`] is immutable once emitted. Producers are the traffic
//! simulator, the realtime service and any application code holding the bus.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use super::foundation::{Timestamp, UserId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Connection state transitions of the simulated realtime link.
pub const EVENT_CONNECTION: &str = "connection";
/// Rolling metrics snapshot after a background sample or call completion.
pub const EVENT_ANALYTICS_UPDATE: &str = "analytics_update";
/// A simulated API call changed state (pending or terminal).
pub const EVENT_API_CALL: &str = "api_call";
/// A collaborator moved their cursor.
pub const EVENT_CURSOR_MOVE: &str = "cursor_move";
/// A collaborator joined the editing session.
pub const EVENT_USER_JOINED: &str = "user_joined";
/// A collaborator left the editing session.
pub const EVENT_USER_LEFT: &str = "user_left";
/// A remote collaborator edited a component.
pub const EVENT_COMPONENT_UPDATE: &str = "component_update";

/// A named event with an opaque JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: JsonValue,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl Event {
    /// Creates an event stamped with the current time.
    pub fn new(event_type: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            timestamp: Timestamp::now(),
            user_id: None,
        }
    }

    /// Attributes the event to a user.
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Overrides the emission time.
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Deserializes the payload into a typed value.
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// State of the simulated realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    #[default]
    Disconnected,
    Failed,
}

impl ConnectionState {
    /// Returns true when events are flowing.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}
