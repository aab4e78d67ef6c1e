//! Canvas components and partial updates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// CSS declarations keyed by camelCase property. Values are usually strings,
/// but numbers (`opacity`, `zIndex`) are kept as authored.
pub type StyleMap = BTreeMap<String, JsonValue>;

/// A UI component placed on the builder canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub props: Map<String, JsonValue>,
    /// CSS declarations, camelCase keys as authored in the properties editor.
    #[serde(default)]
    pub style: StyleMap,
}

impl Component {
    pub fn new(id: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            props: Map::new(),
            style: StyleMap::new(),
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }
}

/// Partial update of a [`Component`].
///
/// Scalar fields overwrite when present. `props` and `style` merge key by
/// key; a JSON `null` value removes the key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPatch {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, JsonValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: StyleMap,
}

impl ComponentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn position(self, x: f64, y: f64) -> Self {
        self.x(x).y(y)
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn style(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Writes the present fields onto `component`.
    pub fn apply(&self, component: &mut Component) {
        if let Some(component_type) = &self.component_type {
            component.component_type = component_type.clone();
        }
        if let Some(x) = self.x {
            component.x = x;
        }
        if let Some(y) = self.y {
            component.y = y;
        }
        if let Some(width) = self.width {
            component.width = width;
        }
        if let Some(height) = self.height {
            component.height = height;
        }
        for (key, value) in &self.props {
            if value.is_null() {
                component.props.remove(key);
            } else {
                component.props.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &self.style {
            if value.is_null() {
                component.style.remove(key);
            } else {
                component.style.insert(key.clone(), value.clone());
            }
        }
    }
}
