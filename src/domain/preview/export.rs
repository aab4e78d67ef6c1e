//! Client-side code export of the current preview.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt::Write;

use crate::domain::foundation::Timestamp;

use super::component::{Component, StyleMap};
use super::state::LivePreviewState;

/// Selector the global styles are attached to.
pub const CANVAS_SELECTOR: &str = ".pagesmith-canvas";

/// Exported preview: data plus generated stylesheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedSnapshot {
    pub components: Vec<Component>,
    pub styles: StyleMap,
    pub css: String,
    pub timestamp: Timestamp,
}

impl ExportedSnapshot {
    pub fn from_state(state: &LivePreviewState, timestamp: Timestamp) -> Self {
        Self {
            components: state.components.clone(),
            styles: state.styles.clone(),
            css: generate_css(state),
            timestamp,
        }
    }
}

/// Renders the global styles followed by one absolutely positioned rule per
/// component, in render order.
pub fn generate_css(state: &LivePreviewState) -> String {
    let mut css = String::new();

    if !state.styles.is_empty() {
        write_rule(&mut css, CANVAS_SELECTOR, declarations_of(&state.styles));
    }

    for component in &state.components {
        let mut declarations = vec![
            ("position".to_string(), "absolute".to_string()),
            ("left".to_string(), format!("{}px", component.x)),
            ("top".to_string(), format!("{}px", component.y)),
        ];
        if component.width > 0.0 {
            declarations.push(("width".to_string(), format!("{}px", component.width)));
        }
        if component.height > 0.0 {
            declarations.push(("height".to_string(), format!("{}px", component.height)));
        }
        declarations.extend(declarations_of(&component.style));

        write_rule(&mut css, &format!("#{}", component.id), declarations.into_iter());
    }

    css
}

fn declarations_of(styles: &StyleMap) -> impl Iterator<Item = (String, String)> + '_ {
    styles
        .iter()
        .filter_map(|(key, value)| css_value(value).map(|v| (css_property(key), v)))
}

/// Strings render as written and numbers unitless. `null` is dropped.
fn css_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn write_rule(css: &mut String, selector: &str, declarations: impl Iterator<Item = (String, String)>) {
    // Writing into a String cannot fail.
    let _ = writeln!(css, "{} {{", selector);
    for (property, value) in declarations {
        let _ = writeln!(css, "  {}: {};", property, value);
    }
    let _ = writeln!(css, "}}");
}

/// `backgroundColor` → `background-color`. Custom properties pass through.
fn css_property(key: &str) -> String {
    if key.starts_with("--") {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
