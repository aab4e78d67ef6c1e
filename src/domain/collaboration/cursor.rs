//! Collaborator cursors and their expiry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::foundation::{Timestamp, UserId};

use super::identity::{color_for, name_for};

/// Cursors older than this are dropped.
pub const CURSOR_TTL: Duration = Duration::from_secs(30);

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A remote collaborator's cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorCursor {
    pub user_id: UserId,
    pub position: Position,
    pub timestamp: Timestamp,
    pub color: String,
    pub name: String,
}

impl CollaboratorCursor {
    /// Builds a cursor, deriving color and name from the user id.
    pub fn new(user_id: UserId, position: Position, timestamp: Timestamp) -> Self {
        let color = color_for(user_id.as_str()).to_string();
        let name = name_for(user_id.as_str());
        Self {
            user_id,
            position,
            timestamp,
            color,
            name,
        }
    }

    /// True once `now - timestamp` exceeds `ttl`.
    pub fn is_expired(&self, now: Timestamp, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now.millis_since(&self.timestamp) > ttl_ms
    }
}

/// Latest cursor per collaborator.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    cursors: HashMap<UserId, CollaboratorCursor>,
    ttl: Duration,
}

impl CursorTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cursors: HashMap::new(),
            ttl,
        }
    }

    /// Records a cursor position, replacing any earlier one for the user.
    pub fn upsert(&mut self, user_id: UserId, position: Position, timestamp: Timestamp) -> &CollaboratorCursor {
        let cursor = CollaboratorCursor::new(user_id.clone(), position, timestamp);
        self.cursors.insert(user_id.clone(), cursor);
        &self.cursors[&user_id]
    }

    pub fn remove(&mut self, user_id: &UserId) -> Option<CollaboratorCursor> {
        self.cursors.remove(user_id)
    }

    /// Drops expired cursors, returning how many were removed.
    pub fn prune(&mut self, now: Timestamp) -> usize {
        let before = self.cursors.len();
        let ttl = self.ttl;
        self.cursors.retain(|_, cursor| !cursor.is_expired(now, ttl));
        before - self.cursors.len()
    }

    /// Live cursors at `now`, ordered by user id.
    pub fn active(&self, now: Timestamp) -> Vec<CollaboratorCursor> {
        let mut active: Vec<CollaboratorCursor> = self
            .cursors
            .values()
            .filter(|cursor| !cursor.is_expired(now, self.ttl))
            .cloned()
            .collect();
        active.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        active
    }

    pub fn get(&self, user_id: &UserId) -> Option<&CollaboratorCursor> {
        self.cursors.get(user_id)
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn clear(&mut self) {
        self.cursors.clear();
    }
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self::new(CURSOR_TTL)
    }
}
