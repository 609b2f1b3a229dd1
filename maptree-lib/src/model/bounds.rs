//! Coordinates and viewport bounds

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new coordinate.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Checks that the coordinate is finite and within latitude/longitude limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng);
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

/// Snapshot of the visible map area.
///
/// Serializes to the request body every tree and layer endpoint expects:
///
/// ```
/// use maptree_lib::model::{Bounds, LatLng};
///
/// let bounds = Bounds::new(LatLng::new(-10.0, 150.0), LatLng::new(-30.0, 135.0));
/// let body = serde_json::to_value(bounds).unwrap();
/// assert_eq!(body["northEast"]["lat"], -10.0);
/// assert_eq!(body["southWest"]["lng"], 135.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub north_east: LatLng,
    pub south_west: LatLng,
}

impl Bounds {
    /// Creates bounds from the north-east and south-west corners.
    pub fn new(north_east: LatLng, south_west: LatLng) -> Self {
        Self {
            north_east,
            south_west,
        }
    }

    /// Returns the centre of the bounds.
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.north_east.lat + self.south_west.lat) / 2.0,
            (self.north_east.lng + self.south_west.lng) / 2.0,
        )
    }

    /// Returns `true` if the point lies inside (or on the edge of) the bounds.
    pub fn contains(&self, point: LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&point.lng)
    }
}
