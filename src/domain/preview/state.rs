//! Live preview state, device modes and the persisted layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::foundation::{Timestamp, ValidationError};

use super::component::{Component, ComponentPatch, StyleMap};

/// Storage key of the persisted preview.
pub const PREVIEW_STORAGE_KEY: &str = "livePreview";

/// How long a [`PendingUpdate`] stays visible.
pub const PENDING_UPDATE_TTL: Duration = Duration::from_millis(300);

/// Device the preview is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl PreviewMode {
    /// Fixed viewport width in CSS pixels; desktop uses the full width.
    pub fn viewport_width(&self) -> Option<u32> {
        match self {
            PreviewMode::Desktop => None,
            PreviewMode::Tablet => Some(768),
            PreviewMode::Mobile => Some(375),
        }
    }

    /// Scale factor applied to the preview frame.
    pub fn scale(&self) -> f64 {
        match self {
            PreviewMode::Desktop => 1.0,
            PreviewMode::Tablet => 0.8,
            PreviewMode::Mobile => 0.6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewMode::Desktop => "desktop",
            PreviewMode::Tablet => "tablet",
            PreviewMode::Mobile => "mobile",
        }
    }
}

impl fmt::Display for PreviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreviewMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(PreviewMode::Desktop),
            "tablet" => Ok(PreviewMode::Tablet),
            "mobile" => Ok(PreviewMode::Mobile),
            other => Err(ValidationError::invalid_format(
                "preview_mode",
                format!("unknown preview mode '{}'", other),
            )),
        }
    }
}

/// State rendered by the preview surface.
///
/// `components` is in render order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePreviewState {
    pub components: Vec<Component>,
    pub styles: StyleMap,
    pub is_live: bool,
    pub last_update: Timestamp,
    pub preview_mode: PreviewMode,
}

impl LivePreviewState {
    pub fn new(now: Timestamp) -> Self {
        Self {
            components: Vec::new(),
            styles: StyleMap::new(),
            is_live: false,
            last_update: now,
            preview_mode: PreviewMode::default(),
        }
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Replaces the component with the same id in place, or appends it.
    pub fn upsert_component(&mut self, component: Component) {
        match self.components.iter_mut().find(|c| c.id == component.id) {
            Some(existing) => *existing = component,
            None => self.components.push(component),
        }
    }

    /// Returns false if no component has this id.
    pub fn remove_component(&mut self, id: &str) -> bool {
        let before = self.components.len();
        self.components.retain(|c| c.id != id);
        before != self.components.len()
    }

    /// Returns false if no component has this id.
    pub fn patch_component(&mut self, id: &str, patch: &ComponentPatch) -> bool {
        match self.components.iter_mut().find(|c| c.id == id) {
            Some(component) => {
                patch.apply(component);
                true
            }
            None => false,
        }
    }
}

/// JSON layout stored under [`PREVIEW_STORAGE_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPreview {
    pub components: Vec<Component>,
    #[serde(default)]
    pub styles: StyleMap,
    #[serde(default)]
    pub preview_mode: PreviewMode,
}

impl PersistedPreview {
    pub fn from_state(state: &LivePreviewState) -> Self {
        Self {
            components: state.components.clone(),
            styles: state.styles.clone(),
            preview_mode: state.preview_mode,
        }
    }

    /// Overwrites the persisted fields of `state`.
    pub fn restore_into(self, state: &mut LivePreviewState) {
        state.components = self.components;
        state.styles = self.styles;
        state.preview_mode = self.preview_mode;
    }
}

/// Transient "saving" marker for a component edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUpdate {
    pub component_id: String,
    pub updates: ComponentPatch,
    pub created_at: Timestamp,
}

impl PendingUpdate {
    /// True once `ttl` has elapsed since creation.
    pub fn is_expired(&self, now: Timestamp, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now.millis_since(&self.created_at) >= ttl_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> LivePreviewState {
        LivePreviewState::new(Timestamp::from_millis(0))
    }

    #[test]
    fn preview_modes_map_to_viewports() {
        assert_eq!(PreviewMode::Desktop.viewport_width(), None);
        assert_eq!(PreviewMode::Tablet.viewport_width(), Some(768));
        assert_eq!(PreviewMode::Mobile.viewport_width(), Some(375));
        assert_eq!(PreviewMode::Mobile.scale(), 0.6);
        assert_eq!("tablet".parse::<PreviewMode>().unwrap(), PreviewMode::Tablet);
        assert!("watch".parse::<PreviewMode>().is_err());
    }

    #[test]
    fn upsert_replaces_in_place_preserving_order() {
        let mut state = state();
        state.upsert_component(Component::new("a", "text"));
        state.upsert_component(Component::new("b", "text"));
        state.upsert_component(Component::new("a", "button"));

        let ids: Vec<&str> = state.components.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(state.component("a").unwrap().component_type, "button");
    }

    #[test]
    fn remove_and_patch_report_missing_components() {
        let mut state = state();
        state.upsert_component(Component::new("a", "text"));

        assert!(!state.remove_component("zzz"));
        assert!(!state.patch_component("zzz", &ComponentPatch::new().x(1.0)));
        assert!(state.patch_component("a", &ComponentPatch::new().x(1.0)));
        assert!(state.remove_component("a"));
        assert!(state.components.is_empty());
    }

    #[test]
    fn persisted_preview_uses_camel_case_layout() {
        let mut state = state();
        state.preview_mode = PreviewMode::Mobile;
        state.upsert_component(Component::new("a", "text"));

        let value = serde_json::to_value(PersistedPreview::from_state(&state)).unwrap();

        assert_eq!(value["previewMode"], "mobile");
        assert_eq!(value["components"][0]["id"], "a");
        assert!(value.get("styles").is_some());
    }

    #[test]
    fn persisted_preview_tolerates_missing_optional_fields() {
        let persisted: PersistedPreview =
            serde_json::from_value(json!({"components": []})).unwrap();
        assert_eq!(persisted.preview_mode, PreviewMode::Desktop);
        assert!(persisted.styles.is_empty());
    }

    #[test]
    fn persisted_preview_accepts_numeric_style_values() {
        let persisted: PersistedPreview = serde_json::from_value(json!({
            "components": [{"id": "hero", "type": "section", "style": {"zIndex": 5}}],
            "styles": {"opacity": 0.5, "color": "red"},
            "previewMode": "tablet"
        }))
        .unwrap();

        assert_eq!(persisted.components[0].style.get("zIndex"), Some(&json!(5)));
        assert_eq!(persisted.styles.get("opacity"), Some(&json!(0.5)));
        assert_eq!(persisted.preview_mode, PreviewMode::Tablet);
    }

    #[test]
    fn pending_update_expires_after_ttl() {
        let pending = PendingUpdate {
            component_id: "a".into(),
            updates: ComponentPatch::new().x(1.0),
            created_at: Timestamp::from_millis(1_000),
        };

        assert!(!pending.is_expired(Timestamp::from_millis(1_299), PENDING_UPDATE_TTL));
        assert!(pending.is_expired(Timestamp::from_millis(1_300), PENDING_UPDATE_TTL));
    }
}
