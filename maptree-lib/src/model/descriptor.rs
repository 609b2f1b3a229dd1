//! Server-supplied layer tree descriptors

use geojson::Feature;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::IconOptions;
use super::LayerStyle;

/// One node of the layer tree as returned by the tree endpoint.
///
/// A descriptor with `children` is a category; any other descriptor is a
/// leaf whose features are loaded from `url`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNodeDescriptor {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNodeDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<LayerStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_table: Vec<String>,
}

impl TreeNodeDescriptor {
    /// Creates a leaf descriptor bound to a data URL.
    pub fn leaf(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Creates a category descriptor.
    pub fn category(label: impl Into<String>, children: Vec<TreeNodeDescriptor>) -> Self {
        Self {
            label: label.into(),
            children: Some(children),
            ..Default::default()
        }
    }

    /// Returns `true` if this descriptor is a category.
    pub fn is_category(&self) -> bool {
        self.children.is_some()
    }

    /// Returns the options a feature layer for this descriptor is created with.
    pub fn layer_options(&self) -> FeatureLayerOptions {
        FeatureLayerOptions {
            id: self
                .id
                .as_deref()
                .filter(|id| !id.is_empty())
                .map(LayerId::from)
                .unwrap_or_else(LayerId::random),
            style: self.style.clone().unwrap_or_default(),
            icon: self.icon.clone(),
            feature_name: self.feature_name.clone(),
            feature_table: self.feature_table.clone(),
        }
    }
}

/// Identifier of a feature layer on a map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Generates a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the widget needs to create a feature layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayerOptions {
    pub id: LayerId,
    pub style: LayerStyle,
    pub icon: Option<IconOptions>,
    /// Property used as the feature's display name.
    pub feature_name: Option<String>,
    /// Properties listed in the feature popup, in order.
    pub feature_table: Vec<String>,
}

impl FeatureLayerOptions {
    /// Creates options with a random id and no styling.
    pub fn new() -> Self {
        Self {
            id: LayerId::random(),
            style: LayerStyle::default(),
            icon: None,
            feature_name: None,
            feature_table: Vec::new(),
        }
    }

    /// Returns the `(property, value)` rows shown in a feature's popup.
    ///
    /// Missing properties are rendered as `undefined`, strings without quotes.
    pub fn popup_rows(&self, feature: &Feature) -> Vec<(String, String)> {
        self.feature_table
            .iter()
            .map(|property| {
                let value = feature
                    .properties
                    .as_ref()
                    .and_then(|props| props.get(property));
                (property.clone(), display_value(value))
            })
            .collect()
    }

    /// Returns the feature's display name, if `feature_name` is set and present.
    pub fn display_name(&self, feature: &Feature) -> Option<String> {
        let key = self.feature_name.as_deref()?;
        let value = feature.properties.as_ref()?.get(key)?;
        Some(display_value(Some(value)))
    }
}

impl Default for FeatureLayerOptions {
    fn default() -> Self {
        Self::new()
    }
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
