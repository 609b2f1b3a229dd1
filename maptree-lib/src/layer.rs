//! Lazily populated feature layers
//!
//! A [`LazyLayer`] holds no data until it is shown. Showing it fetches the
//! features inside the current viewport; hiding it drops them again.
//!
//! Every toggle bumps the layer's generation. A fetch remembers the
//! generation it was dispatched under and its response is discarded if the
//! layer has been toggled since, so the last request always wins:
//!
//! ```text
//! show()  gen 1  ── POST ───────────────────────┐ (slow)
//! hide()  gen 2  clear                          │
//! show()  gen 3  ── POST ──┐                    │
//!                          └─ apply (gen 3 ok)  │
//!                                               └─ discard (gen 1 < 3)
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use geojson::Feature;
use geojson::FeatureCollection;
use log::debug;
use log::error;

use crate::error::ConfigError;
use crate::error::Error;
use crate::error::LoadError;
use crate::model::Bounds;
use crate::model::FeatureLayerOptions;
use crate::model::LayerId;
use crate::source::FeatureSource;
use crate::widget::MapWidget;

/// Whether a layer currently holds data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Empty,
    Populated,
}

/// What became of one fetch.
///
/// Failures are logged and reported here instead of being returned as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was applied; `features` is the layer's new total.
    Populated { features: usize },
    /// The layer was toggled while the request was in flight; the response was dropped.
    Stale,
    /// The request failed; the layer was left unchanged.
    Failed(LoadError),
}

impl LoadOutcome {
    /// Returns `true` if the response was applied.
    pub fn is_populated(&self) -> bool {
        matches!(self, LoadOutcome::Populated { .. })
    }
}

/// A feature layer bound to a data URL, populated on demand.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct LazyLayer {
    inner: Arc<LazyLayerInner>,
}

struct LazyLayerInner {
    label: String,
    url: Option<String>,
    options: FeatureLayerOptions,
    source: Arc<dyn FeatureSource>,
    widget: Arc<dyn MapWidget>,
    data: Mutex<LayerData>,
}

struct LayerData {
    state: LayerState,
    visible: bool,
    generation: u64,
    features: Vec<Feature>,
    errors: usize,
    last_error: Option<LoadError>,
}

impl LazyLayer {
    /// Creates an empty, hidden layer and registers it with the widget.
    pub fn new(
        label: impl Into<String>,
        url: Option<String>,
        options: FeatureLayerOptions,
        source: Arc<dyn FeatureSource>,
        widget: Arc<dyn MapWidget>,
    ) -> Self {
        widget.add_feature_layer(&options);
        Self {
            inner: Arc::new(LazyLayerInner {
                label: label.into(),
                url,
                options,
                source,
                widget,
                data: Mutex::new(LayerData {
                    state: LayerState::Empty,
                    visible: false,
                    generation: 0,
                    features: Vec::new(),
                    errors: 0,
                    last_error: None,
                }),
            }),
        }
    }

    /// Marks the layer visible and starts loading it.
    ///
    /// The toggle and the viewport snapshot happen immediately; the returned
    /// future performs the request and applies the response.
    pub fn show(&self) -> impl Future<Output = LoadOutcome> + Send + use<> {
        let generation = {
            let mut data = self.lock();
            data.visible = true;
            data.generation += 1;
            data.generation
        };
        self.dispatch(generation)
    }

    /// Marks the layer hidden and discards its features.
    ///
    /// Any request still in flight will be dropped when it completes.
    pub fn hide(&self) {
        let mut data = self.lock();
        data.visible = false;
        data.generation += 1;
        data.features.clear();
        data.state = LayerState::Empty;
        self.inner.widget.clear_layer(&self.inner.options.id);
        debug!(
            "Layer '{}' hidden (generation {})",
            self.inner.label, data.generation
        );
    }

    /// Hides the layer and removes it from the widget.
    ///
    /// Used when the layer's tree is replaced. A request still in flight is
    /// dropped when it completes.
    pub fn detach(&self) {
        let mut data = self.lock();
        data.visible = false;
        data.generation += 1;
        data.features.clear();
        data.state = LayerState::Empty;
        self.inner.widget.remove_feature_layer(&self.inner.options.id);
        debug!("Layer '{}' detached", self.inner.label);
    }

    /// Forwards a visibility change from the tree control.
    ///
    /// Returns the load outcome when the layer was shown.
    pub async fn set_visible(&self, visible: bool) -> Option<LoadOutcome> {
        if visible {
            Some(self.show().await)
        } else {
            self.hide();
            None
        }
    }

    /// Re-fetches a visible layer against the current viewport.
    ///
    /// Existing features are replaced. Hidden layers are left alone.
    pub async fn reload(&self) -> Option<LoadOutcome> {
        let generation = {
            let mut data = self.lock();
            if !data.visible {
                return None;
            }
            data.generation += 1;
            data.features.clear();
            data.state = LayerState::Empty;
            self.inner.widget.clear_layer(&self.inner.options.id);
            data.generation
        };
        Some(self.dispatch(generation).await)
    }

    fn dispatch(&self, generation: u64) -> impl Future<Output = LoadOutcome> + Send + use<> {
        let bounds = self.inner.widget.bounds();
        let layer = self.clone();
        async move {
            let result = layer.fetch(&bounds).await;
            layer.apply(generation, result)
        }
    }

    async fn fetch(&self, bounds: &Bounds) -> Result<FeatureCollection, Error> {
        let url = match self.inner.url.as_deref() {
            None => {
                return Err(ConfigError::MissingSource {
                    label: self.inner.label.clone(),
                }
                .into());
            }
            Some(url) if url.trim().is_empty() => return Err(ConfigError::EmptyUrl.into()),
            Some(url) => url,
        };
        debug!("Loading layer '{}' from {}", self.inner.label, url);
        Ok(self.inner.source.fetch_features(url, bounds).await?)
    }

    fn apply(&self, generation: u64, result: Result<FeatureCollection, Error>) -> LoadOutcome {
        let mut data = self.lock();

        if data.generation != generation {
            debug!(
                "Discarding stale response for layer '{}' (generation {}, current {})",
                self.inner.label, generation, data.generation
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(collection) => {
                self.inner
                    .widget
                    .add_data(&self.inner.options.id, &collection);
                data.features.extend(collection.features);
                data.state = LayerState::Populated;
                LoadOutcome::Populated {
                    features: data.features.len(),
                }
            }
            Err(err) => {
                error!("Failed to load tree layer '{}': {}", self.inner.label, err);
                let kind = LoadError::from(&err);
                data.errors += 1;
                data.last_error = Some(kind);
                LoadOutcome::Failed(kind)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, LayerData> {
        self.inner
            .data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &LayerId {
        &self.inner.options.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn url(&self) -> Option<&str> {
        self.inner.url.as_deref()
    }

    pub fn options(&self) -> &FeatureLayerOptions {
        &self.inner.options
    }

    pub fn state(&self) -> LayerState {
        self.lock().state
    }

    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    pub fn feature_count(&self) -> usize {
        self.lock().features.len()
    }

    /// Returns a copy of the rendered features.
    pub fn features(&self) -> Vec<Feature> {
        self.lock().features.clone()
    }

    /// Number of failed loads logged for this layer.
    pub fn error_count(&self) -> usize {
        self.lock().errors
    }

    pub fn last_error(&self) -> Option<LoadError> {
        self.lock().last_error
    }

    /// Current toggle generation; starts at zero.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }
}

impl std::fmt::Debug for LazyLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.lock();
        f.debug_struct("LazyLayer")
            .field("id", &self.inner.options.id)
            .field("label", &self.inner.label)
            .field("url", &self.inner.url)
            .field("state", &data.state)
            .field("visible", &data.visible)
            .field("generation", &data.generation)
            .field("features", &data.features.len())
            .finish_non_exhaustive()
    }
}
