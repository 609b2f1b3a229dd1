//! Map configuration

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::model::IconOptions;
use crate::model::LatLng;
use crate::model::LayerStyle;
use crate::model::TreeNodeDescriptor;

const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const DEFAULT_ATTRIBUTION: &str =
    "&copy; <a href=\"http://www.openstreetmap.org/copyright\">OpenStreetMap</a>";

/// Every option a map is created with.
///
/// Deserializes from the camel-cased settings object a host page supplies;
/// any missing field takes its default.
///
/// # Example
///
/// ```
/// use maptree_lib::config::{LayerSource, MapConfig};
///
/// let config = MapConfig::default()
///     .with_zoom(4, 2, 12)
///     .with_reload_on_pan(true)
///     .with_layer(LayerSource::tree("/map/tree/"));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// Initial centre of the map.
    ///
    /// Default: -20.917574, 142.702789 (Queensland)
    pub view_port: LatLng,

    /// Initial zoom level.
    ///
    /// Default: 6
    pub zoom_level: u8,

    /// Default: 2
    pub min_zoom: u8,

    /// Default: 19
    pub max_zoom: u8,

    /// Base map tile URL template.
    ///
    /// Default: OpenStreetMap
    pub tile_url: String,

    /// Attribution HTML shown for the base map.
    pub attribution: String,

    /// Names of extra widgets the host should enable.
    pub widgets: Vec<String>,

    /// Re-fetch visible layers whenever the viewport changes.
    ///
    /// Default: false
    pub reload_on_pan: bool,

    /// Zoom to a feature when it is clicked.
    ///
    /// Default: true
    pub zoom_to_clicked_feature: bool,

    /// Layers loaded when the map is created, in order.
    pub layers: Vec<LayerSource>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            view_port: LatLng::new(-20.917574, 142.702789),
            zoom_level: 6,
            min_zoom: 2,
            max_zoom: 19,
            tile_url: DEFAULT_TILE_URL.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            widgets: Vec::new(),
            reload_on_pan: false,
            zoom_to_clicked_feature: true,
            layers: Vec::new(),
        }
    }
}

impl MapConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial centre.
    pub fn with_view_port(mut self, center: LatLng) -> Self {
        self.view_port = center;
        self
    }

    /// Sets the initial zoom level and the allowed range.
    pub fn with_zoom(mut self, zoom: u8, min: u8, max: u8) -> Self {
        self.zoom_level = zoom;
        self.min_zoom = min;
        self.max_zoom = max;
        self
    }

    /// Sets the base map tile source and its attribution.
    pub fn with_tiles(mut self, url: impl Into<String>, attribution: impl Into<String>) -> Self {
        self.tile_url = url.into();
        self.attribution = attribution.into();
        self
    }

    /// Adds a widget name.
    pub fn with_widget(mut self, widget: impl Into<String>) -> Self {
        self.widgets.push(widget.into());
        self
    }

    /// Enables or disables reloading visible layers when the view changes.
    pub fn with_reload_on_pan(mut self, enabled: bool) -> Self {
        self.reload_on_pan = enabled;
        self
    }

    /// Enables or disables zooming to clicked features.
    pub fn with_zoom_to_clicked_feature(mut self, enabled: bool) -> Self {
        self.zoom_to_clicked_feature = enabled;
        self
    }

    /// Appends a layer source.
    pub fn with_layer(mut self, layer: LayerSource) -> Self {
        self.layers.push(layer);
        self
    }

    /// Checks zoom limits, the initial view and layer URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::InvalidZoom {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if !(self.min_zoom..=self.max_zoom).contains(&self.zoom_level) {
            return Err(ConfigError::ZoomOutOfRange {
                zoom: self.zoom_level,
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        self.view_port.validate()?;
        if self.tile_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        for layer in &self.layers {
            if layer.url().trim().is_empty() {
                return Err(ConfigError::EmptyUrl);
            }
        }
        Ok(())
    }

    /// Returns the base tile layer settings.
    pub fn tile_layer(&self) -> TileLayerConfig {
        TileLayerConfig {
            url: self.tile_url.clone(),
            attribution: self.attribution.clone(),
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
        }
    }
}

/// Base map tile source.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayerConfig {
    pub url: String,
    pub attribution: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

/// A layer loaded when the map is created.
///
/// An entry with both `url` and `treeUrl` is a feature layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerSource {
    /// A single feature layer fetched once from `url` and always shown.
    Features {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<LayerStyle>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<IconOptions>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feature_name: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        feature_table: Vec<String>,
    },
    /// A layer tree fetched from `treeUrl`.
    Tree {
        #[serde(rename = "treeUrl")]
        tree_url: String,
    },
}

impl LayerSource {
    /// A layer tree source.
    pub fn tree(tree_url: impl Into<String>) -> Self {
        Self::Tree {
            tree_url: tree_url.into(),
        }
    }

    /// A plain feature layer source.
    pub fn features(url: impl Into<String>) -> Self {
        Self::Features {
            url: url.into(),
            label: None,
            id: None,
            style: None,
            icon: None,
            feature_name: None,
            feature_table: Vec::new(),
        }
    }

    /// Returns the endpoint this source loads from.
    pub fn url(&self) -> &str {
        match self {
            Self::Tree { tree_url } => tree_url,
            Self::Features { url, .. } => url,
        }
    }

    /// Describes a feature source as a leaf descriptor.
    ///
    /// Returns `None` for tree sources.
    pub fn as_descriptor(&self) -> Option<TreeNodeDescriptor> {
        match self {
            Self::Tree { .. } => None,
            Self::Features {
                url,
                label,
                id,
                style,
                icon,
                feature_name,
                feature_table,
            } => Some(TreeNodeDescriptor {
                label: label.clone().unwrap_or_else(|| url.clone()),
                url: Some(url.clone()),
                id: id.clone(),
                style: style.clone(),
                icon: icon.clone(),
                feature_name: feature_name.clone(),
                feature_table: feature_table.clone(),
                ..Default::default()
            }),
        }
    }
}
