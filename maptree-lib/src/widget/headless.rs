//! A widget with no display that records what it is asked to do

use std::sync::Mutex;
use std::sync::PoisonError;

use geojson::FeatureCollection;

use super::MapWidget;
use crate::config::TileLayerConfig;
use crate::model::Bounds;
use crate::model::FeatureLayerOptions;
use crate::model::LatLng;
use crate::model::LayerId;
use crate::tree::TreeControlOptions;
use crate::tree::TreeNode;

/// A call received by a [`HeadlessWidget`].
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    CreateMap {
        container: String,
        center: LatLng,
        zoom: u8,
    },
    AddTileLayer {
        url: String,
    },
    AddFeatureLayer {
        id: LayerId,
    },
    AddData {
        id: LayerId,
        features: usize,
    },
    ClearLayer {
        id: LayerId,
    },
    RemoveFeatureLayer {
        id: LayerId,
    },
    AddTreeControl {
        roots: Vec<String>,
        options: TreeControlOptions,
    },
    RemoveTreeControl,
}

/// A [`MapWidget`] with a fixed, settable viewport.
///
/// Used for tests and for previewing a tree endpoint without a browser.
///
/// # Example
///
/// ```
/// use maptree_lib::model::{Bounds, LatLng};
/// use maptree_lib::widget::HeadlessWidget;
///
/// let widget = HeadlessWidget::new(Bounds::new(
///     LatLng::new(-10.0, 154.0),
///     LatLng::new(-29.0, 138.0),
/// ));
/// assert!(widget.events().is_empty());
/// ```
#[derive(Debug)]
pub struct HeadlessWidget {
    bounds: Mutex<Bounds>,
    events: Mutex<Vec<WidgetEvent>>,
}

impl HeadlessWidget {
    /// Creates a widget showing `bounds`.
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds: Mutex::new(bounds),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Moves the viewport.
    pub fn set_bounds(&self, bounds: Bounds) {
        *self.bounds.lock().unwrap_or_else(PoisonError::into_inner) = bounds;
    }

    /// Returns every call received so far, oldest first.
    pub fn events(&self) -> Vec<WidgetEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forgets recorded calls.
    pub fn clear_events(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, event: WidgetEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl MapWidget for HeadlessWidget {
    fn create_map(&self, container: &str, center: LatLng, zoom: u8) {
        self.record(WidgetEvent::CreateMap {
            container: container.to_string(),
            center,
            zoom,
        });
    }

    fn add_tile_layer(&self, tiles: &TileLayerConfig) {
        self.record(WidgetEvent::AddTileLayer {
            url: tiles.url.clone(),
        });
    }

    fn bounds(&self) -> Bounds {
        *self.bounds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add_feature_layer(&self, options: &FeatureLayerOptions) {
        self.record(WidgetEvent::AddFeatureLayer {
            id: options.id.clone(),
        });
    }

    fn add_data(&self, layer: &LayerId, features: &FeatureCollection) {
        self.record(WidgetEvent::AddData {
            id: layer.clone(),
            features: features.features.len(),
        });
    }

    fn clear_layer(&self, layer: &LayerId) {
        self.record(WidgetEvent::ClearLayer { id: layer.clone() });
    }

    fn remove_feature_layer(&self, layer: &LayerId) {
        self.record(WidgetEvent::RemoveFeatureLayer { id: layer.clone() });
    }

    fn add_tree_control(&self, tree: &[TreeNode], options: &TreeControlOptions) {
        self.record(WidgetEvent::AddTreeControl {
            roots: tree.iter().map(|node| node.label().to_string()).collect(),
            options: options.clone(),
        });
    }

    fn remove_tree_control(&self) {
        self.record(WidgetEvent::RemoveTreeControl);
    }
}
