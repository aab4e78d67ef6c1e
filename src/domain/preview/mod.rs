//! Preview domain - canvas components, preview state and export.

mod component;
mod export;
mod state;

pub use component::{Component, ComponentPatch, StyleMap};
pub use export::{generate_css, ExportedSnapshot, CANVAS_SELECTOR};
pub use state::{
    LivePreviewState, PendingUpdate, PersistedPreview, PreviewMode, PENDING_UPDATE_TTL,
    PREVIEW_STORAGE_KEY,
};
