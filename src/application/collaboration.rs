//! CollaborationTracker - remote cursors and presence from bus events.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::collaboration::{CollaboratorCursor, CursorTracker, Position, CURSOR_TTL};
use crate::domain::events::{Event, EVENT_CURSOR_MOVE, EVENT_USER_JOINED, EVENT_USER_LEFT};
use crate::domain::foundation::{DomainError, ErrorCode, UserId, ValidationError};
use crate::ports::{Clock, EventHandler, EventSubscriber, Subscription};

/// Event types the tracker listens to.
pub const COLLABORATION_EVENT_TYPES: &[&str] =
    &[EVENT_CURSOR_MOVE, EVENT_USER_JOINED, EVENT_USER_LEFT];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorMovePayload {
    user_id: UserId,
    position: Position,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresencePayload {
    user_id: UserId,
}

#[derive(Debug)]
struct Presence {
    cursors: CursorTracker,
    members: BTreeSet<UserId>,
}

/// Keeps the latest cursor per collaborator and who is in the session.
///
/// Cursors idle longer than the TTL are pruned whenever they are read.
pub struct CollaborationTracker {
    clock: Arc<dyn Clock>,
    presence: Mutex<Presence>,
}

impl CollaborationTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, CURSOR_TTL)
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, cursor_ttl: Duration) -> Self {
        Self {
            clock,
            presence: Mutex::new(Presence {
                cursors: CursorTracker::new(cursor_ttl),
                members: BTreeSet::new(),
            }),
        }
    }

    /// Create as an Arc (for sharing with event subscriber).
    pub fn new_shared(clock: Arc<dyn Clock>, cursor_ttl: Duration) -> Arc<Self> {
        Arc::new(Self::with_ttl(clock, cursor_ttl))
    }

    /// Subscribe to cursor and presence events.
    pub fn register(self: &Arc<Self>, subscriber: &dyn EventSubscriber) -> Vec<Subscription> {
        subscriber.subscribe_all(COLLABORATION_EVENT_TYPES, self.clone())
    }

    fn presence(&self) -> MutexGuard<'_, Presence> {
        self.presence.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Live cursors, sorted by user id.
    pub fn cursors(&self) -> Vec<CollaboratorCursor> {
        let now = self.clock.now();
        let mut presence = self.presence();
        presence.cursors.prune(now);
        presence.cursors.active(now)
    }

    /// Session members, sorted.
    pub fn members(&self) -> Vec<UserId> {
        self.presence().members.iter().cloned().collect()
    }

    /// Distinct users that are members or have a live cursor.
    pub fn active_users(&self) -> usize {
        let now = self.clock.now();
        let mut presence = self.presence();
        presence.cursors.prune(now);
        let mut users: BTreeSet<UserId> = presence.members.clone();
        users.extend(presence.cursors.active(now).into_iter().map(|c| c.user_id));
        users.len()
    }

    fn parse<T: serde::de::DeserializeOwned>(event: &Event) -> Result<T, DomainError> {
        event.payload_as().map_err(|e| {
            ValidationError::invalid_format(event.event_type.clone(), e.to_string()).into()
        })
    }
}

impl EventHandler for CollaborationTracker {
    fn handle(&self, event: &Event) -> Result<(), DomainError> {
        match event.event_type.as_str() {
            EVENT_CURSOR_MOVE => {
                let payload: CursorMovePayload = Self::parse(event)?;
                let now = self.clock.now();
                self.presence()
                    .cursors
                    .upsert(payload.user_id, payload.position, now);
            }
            EVENT_USER_JOINED => {
                let payload: PresencePayload = Self::parse(event)?;
                self.presence().members.insert(payload.user_id);
            }
            EVENT_USER_LEFT => {
                let payload: PresencePayload = Self::parse(event)?;
                let mut presence = self.presence();
                presence.members.remove(&payload.user_id);
                presence.cursors.remove(&payload.user_id);
            }
            other => {
                return Err(DomainError::new(
                    ErrorCode::HandlerFailed,
                    format!("unexpected event type {other}"),
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "CollaborationTracker"
    }
}
