//! An interactive map instance

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use dashmap::DashMap;
use futures::future::join_all;
use log::error;
use log::info;
use log::warn;

use crate::config::LayerSource;
use crate::config::MapConfig;
use crate::error::ConfigError;
use crate::layer::LazyLayer;
use crate::layer::LoadOutcome;
use crate::model::LayerId;
use crate::model::TreeNodeDescriptor;
use crate::source::FeatureSource;
use crate::tree;
use crate::tree::TreeControlOptions;
use crate::tree::TreeConverter;
use crate::tree::TreeNode;
use crate::widget::MapWidget;

/// One map on the host page, with its layers and layer tree.
///
/// # Example
///
/// ```ignore
/// let map = InteractiveMap::new("map", config, widget, Arc::new(client))?;
/// map.load_layers().await;
///
/// // forwarded from the tree control's checkbox handler
/// map.set_layer_visible(&id, true).await;
/// ```
pub struct InteractiveMap {
    container: String,
    config: MapConfig,
    widget: Arc<dyn MapWidget>,
    source: Arc<dyn FeatureSource>,
    converter: TreeConverter,
    layers: DashMap<LayerId, LazyLayer>,
    tree: Mutex<Option<Arc<Vec<TreeNode>>>>,
}

impl InteractiveMap {
    /// Validates `config`, creates the map in `container` and adds the base tiles.
    ///
    /// Layers are not loaded until [`load_layers`](Self::load_layers) is called.
    pub fn new(
        container: impl Into<String>,
        config: MapConfig,
        widget: Arc<dyn MapWidget>,
        source: Arc<dyn FeatureSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let container = container.into();

        widget.create_map(&container, config.view_port, config.zoom_level);
        widget.add_tile_layer(&config.tile_layer());
        info!(
            "Created map '{}' at ({}, {}) zoom {}",
            container, config.view_port.lat, config.view_port.lng, config.zoom_level
        );

        Ok(Self {
            converter: TreeConverter::new(source.clone(), widget.clone()),
            container,
            config,
            widget,
            source,
            layers: DashMap::new(),
            tree: Mutex::new(None),
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Loads every configured layer source.
    ///
    /// Sources load concurrently. Failures are logged; the return value is
    /// the number of sources that loaded.
    pub async fn load_layers(&self) -> usize {
        let loads = self.config.layers.iter().map(|layer| self.load_source(layer));
        join_all(loads).await.into_iter().filter(|ok| *ok).count()
    }

    async fn load_source(&self, layer: &LayerSource) -> bool {
        match layer {
            LayerSource::Tree { tree_url } => self.load_tree(tree_url).await,
            LayerSource::Features { .. } => match layer.as_descriptor() {
                Some(descriptor) => self.load_feature_layer(&descriptor).await.is_populated(),
                None => false,
            },
        }
    }

    /// Fetches a layer tree and installs it as the tree control.
    ///
    /// Returns `false` (after logging) if the tree could not be fetched.
    pub async fn load_tree(&self, tree_url: &str) -> bool {
        let bounds = self.widget.bounds();
        match self.source.fetch_tree(tree_url, &bounds).await {
            Ok(descriptors) => {
                self.install_tree(&descriptors);
                true
            }
            Err(err) => {
                error!("Error fetching layer tree from {}: {}", tree_url, err);
                false
            }
        }
    }

    /// Converts descriptors and installs them as the tree control.
    ///
    /// An existing tree control is removed first and its layers detached from
    /// the widget before the new layers are created.
    pub fn install_tree(&self, descriptors: &[TreeNodeDescriptor]) -> Arc<Vec<TreeNode>> {
        let previous = self
            .tree
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(previous) = previous {
            warn!("Replacing layer tree on map '{}'", self.container);
            self.widget.remove_tree_control();
            for leaf in tree::leaves(&previous) {
                leaf.layer.detach();
                self.layers.remove(leaf.layer.id());
            }
        }

        let tree = Arc::new(self.converter.convert(descriptors));
        for leaf in tree::leaves(&tree) {
            self.register(leaf.layer.clone());
        }
        *self.tree.lock().unwrap_or_else(PoisonError::into_inner) = Some(tree.clone());

        self.widget.add_tree_control(&tree, &TreeControlOptions::default());
        info!(
            "Installed layer tree with {} layers on map '{}'",
            tree::leaves(&tree).len(),
            self.container
        );
        tree
    }

    /// Creates a feature layer that is shown immediately and loads once.
    pub async fn load_feature_layer(&self, descriptor: &TreeNodeDescriptor) -> LoadOutcome {
        let layer = LazyLayer::new(
            descriptor.label.clone(),
            descriptor.url.clone(),
            descriptor.layer_options(),
            self.source.clone(),
            self.widget.clone(),
        );
        self.register(layer.clone());
        layer.show().await
    }

    fn register(&self, layer: LazyLayer) {
        if let Some(old) = self.layers.insert(layer.id().clone(), layer) {
            warn!("Layer id '{}' registered twice; keeping the newer layer", old.id());
        }
    }

    /// Returns the current layer tree, if one is installed.
    pub fn tree(&self) -> Option<Arc<Vec<TreeNode>>> {
        self.tree
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Looks up a layer by id.
    pub fn layer(&self, id: &LayerId) -> Option<LazyLayer> {
        self.layers.get(id).map(|entry| entry.value().clone())
    }

    /// Ids of every layer on the map, sorted.
    pub fn layer_ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<_> = self.layers.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Forwards a visibility toggle to a layer.
    ///
    /// Returns `None` for unknown ids and for hides.
    pub async fn set_layer_visible(&self, id: &LayerId, visible: bool) -> Option<LoadOutcome> {
        match self.layer(id) {
            Some(layer) => layer.set_visible(visible).await,
            None => {
                warn!("No layer '{}' on map '{}'", id, self.container);
                None
            }
        }
    }

    /// Tells the map its viewport moved.
    ///
    /// With `reload_on_pan` set, every visible layer is re-fetched against
    /// the new bounds. Returns the number of layers reloaded.
    pub async fn on_view_changed(&self) -> usize {
        if !self.config.reload_on_pan {
            return 0;
        }
        let visible: Vec<LazyLayer> = self
            .layers
            .iter()
            .filter(|e| e.value().is_visible())
            .map(|e| e.value().clone())
            .collect();
        join_all(visible.iter().map(|layer| layer.reload()))
            .await
            .into_iter()
            .flatten()
            .count()
    }
}

impl std::fmt::Debug for InteractiveMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveMap")
            .field("container", &self.container)
            .field("layers", &self.layers.len())
            .finish_non_exhaustive()
    }
}
