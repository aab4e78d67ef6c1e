//! Collaboration domain - remote cursors and collaborator identity.

mod cursor;
mod identity;

pub use cursor::{CollaboratorCursor, CursorTracker, Position, CURSOR_TTL};
pub use identity::{color_for, name_for, user_hash, CURSOR_PALETTE};
