//! The seam between layers and the network

use async_trait::async_trait;
use geojson::Feature;
use geojson::FeatureCollection;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FetchError;
use crate::model::Bounds;
use crate::model::TreeNodeDescriptor;

/// Something that can answer bounds-scoped tree and layer requests.
///
/// [`FeatureClient`](crate::FeatureClient) is the HTTP implementation. Tests
/// and offline hosts can provide their own.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Fetches the features of one layer within `bounds`.
    async fn fetch_features(
        &self,
        url: &str,
        bounds: &Bounds,
    ) -> Result<FeatureCollection, FetchError>;

    /// Fetches the layer tree within `bounds`.
    async fn fetch_tree(
        &self,
        url: &str,
        bounds: &Bounds,
    ) -> Result<Vec<TreeNodeDescriptor>, FetchError>;
}

/// Decodes a layer endpoint body.
///
/// Accepts a FeatureCollection, a bare array of features, or either of those
/// encoded once more as a JSON string.
pub fn decode_feature_collection(body: &str) -> Result<FeatureCollection, FetchError> {
    let value = decode_value(body)?;
    let collection = match value {
        Value::Array(_) => {
            let features: Vec<Feature> = serde_json::from_value(value)
                .map_err(|e| FetchError::parse_with_body(e.to_string(), body))?;
            FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            }
        }
        other => serde_json::from_value(other)
            .map_err(|e| FetchError::parse_with_body(e.to_string(), body))?,
    };
    Ok(collection)
}

/// Decodes a tree endpoint body.
pub fn decode_tree(body: &str) -> Result<Vec<TreeNodeDescriptor>, FetchError> {
    decode_json(body)
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    let value = decode_value(body)?;
    serde_json::from_value(value).map_err(|e| FetchError::parse_with_body(e.to_string(), body))
}

fn decode_value(body: &str) -> Result<Value, FetchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::parse_with_body(e.to_string(), body))?;

    // Some endpoints serialize their GeoJSON to text first and then wrap that
    // text in a JSON response, so the payload arrives as a string.
    match value {
        Value::String(inner) => serde_json::from_str(&inner).map_err(|e| {
            FetchError::parse_with_body(format!("string payload is not JSON: {}", e), body)
        }),
        other => Ok(other),
    }
}
