//! Interactive map layer trees
//!
//! Builds a collapsible layer tree from a server-supplied JSON tree and loads
//! each layer's GeoJSON on demand, scoped to the current viewport. Rendering
//! is left to the host's mapping widget (see [`widget::MapWidget`]).

pub mod config;
pub mod csrf;
pub mod error;
pub mod layer;
pub mod model;
pub mod registry;
pub mod source;
pub mod tree;
pub mod widget;

mod client;
mod map;

#[cfg(test)]
mod test_support;

pub use client::*;
pub use layer::LazyLayer;
pub use layer::LayerState;
pub use layer::LoadOutcome;
pub use map::InteractiveMap;
pub use registry::MapRegistry;
pub use source::FeatureSource;
