//! The mapping widget the library drives

mod headless;

pub use headless::*;

use geojson::FeatureCollection;

use crate::config::TileLayerConfig;
use crate::model::Bounds;
use crate::model::FeatureLayerOptions;
use crate::model::LatLng;
use crate::model::LayerId;
use crate::tree::TreeControlOptions;
use crate::tree::TreeNode;

/// The external mapping library, seen from the library's side.
///
/// Rendering, projection, tiling and event dispatch all happen behind this
/// trait. Visibility toggles travel the other way: the host forwards them to
/// [`LazyLayer::set_visible`](crate::layer::LazyLayer::set_visible).
///
/// Calls are synchronous; implementations must not call back into the layer
/// that invoked them.
pub trait MapWidget: Send + Sync {
    /// Creates the map inside `container`, centred on `center`.
    fn create_map(&self, container: &str, center: LatLng, zoom: u8);

    /// Adds the base tile layer.
    fn add_tile_layer(&self, tiles: &TileLayerConfig);

    /// Returns the currently visible area.
    fn bounds(&self) -> Bounds;

    /// Creates an empty feature layer.
    fn add_feature_layer(&self, options: &FeatureLayerOptions);

    /// Adds features to an existing feature layer.
    fn add_data(&self, layer: &LayerId, features: &FeatureCollection);

    /// Removes every feature from a feature layer.
    fn clear_layer(&self, layer: &LayerId);

    /// Removes a feature layer entirely.
    fn remove_feature_layer(&self, layer: &LayerId);

    /// Installs the layer tree control.
    fn add_tree_control(&self, tree: &[TreeNode], options: &TreeControlOptions);

    /// Removes the installed layer tree control.
    fn remove_tree_control(&self);
}
