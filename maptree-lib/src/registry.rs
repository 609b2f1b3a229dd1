//! Map instances keyed by container

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::config::MapConfig;
use crate::error::ConfigError;
use crate::map::InteractiveMap;
use crate::source::FeatureSource;
use crate::widget::MapWidget;

/// The maps on a host page, keyed by container id.
///
/// Owned by the host and passed where it is needed; opening a container
/// twice returns the map created the first time.
///
/// # Example
///
/// ```ignore
/// let registry = MapRegistry::new();
/// let map = registry.open("map", config, widget.clone(), source.clone())?;
/// let same = registry.open("map", MapConfig::default(), widget, source)?;
/// assert!(Arc::ptr_eq(&map, &same));
/// ```
#[derive(Debug, Default)]
pub struct MapRegistry {
    maps: DashMap<String, Arc<InteractiveMap>>,
}

impl MapRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            maps: DashMap::new(),
        }
    }

    /// Returns the map in `container`, creating it if there is none.
    ///
    /// `config`, `widget` and `source` are ignored when the map already exists.
    pub fn open(
        &self,
        container: &str,
        config: MapConfig,
        widget: Arc<dyn MapWidget>,
        source: Arc<dyn FeatureSource>,
    ) -> Result<Arc<InteractiveMap>, ConfigError> {
        self.get_or_try_insert_with(container, || {
            InteractiveMap::new(container, config, widget, source)
        })
    }

    /// Returns the map in `container`, creating it with `create` if there is none.
    pub fn get_or_try_insert_with<F>(
        &self,
        container: &str,
        create: F,
    ) -> Result<Arc<InteractiveMap>, ConfigError>
    where
        F: FnOnce() -> Result<InteractiveMap, ConfigError>,
    {
        match self.maps.entry(container.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let map = Arc::new(create()?);
                entry.insert(map.clone());
                Ok(map)
            }
        }
    }

    /// Returns the map in `container`, if any.
    pub fn get(&self, container: &str) -> Option<Arc<InteractiveMap>> {
        self.maps.get(container).map(|entry| entry.value().clone())
    }

    /// Removes and returns the map in `container`.
    pub fn remove(&self, container: &str) -> Option<Arc<InteractiveMap>> {
        self.maps.remove(container).map(|(_, map)| map)
    }

    /// Container ids with a map, sorted.
    pub fn containers(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.maps.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
