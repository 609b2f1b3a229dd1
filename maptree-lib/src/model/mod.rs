//! Data model types

mod bounds;
mod descriptor;
mod style;

pub use bounds::*;
pub use descriptor::*;
pub use style::*;

pub use geojson::Feature;
pub use geojson::FeatureCollection;
