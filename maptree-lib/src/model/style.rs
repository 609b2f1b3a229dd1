//! Presentation options passed through to the mapping widget

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// An RGBA colour with every channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub [f64; 4]);

impl Rgba {
    /// Returns the red, green and blue channels scaled to `0..=255`.
    pub fn rgb_bytes(&self) -> [u8; 3] {
        let [r, g, b, _] = self.0;
        [r, g, b].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Returns the alpha channel.
    pub fn alpha(&self) -> f64 {
        self.0[3]
    }
}

/// Path style for a feature layer.
///
/// Keys the library does not know about are preserved in `extra` so they
/// still reach the widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Marker icon used for point features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconOptions {
    pub icon_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_anchor: Option<[i32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup_anchor: Option<[i32; 2]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_keeps_unknown_keys() {
        let style: LayerStyle = serde_json::from_value(serde_json::json!({
            "color": [1.0, 0.5, 0.0, 1.0],
            "fillOpacity": 0.2,
            "dashArray": "4 2",
        }))
        .unwrap();

        let color = style.color.unwrap();
        assert_eq!(color.rgb_bytes(), [255, 128, 0]);
        assert_eq!(color.alpha(), 1.0);
        assert_eq!(style.fill_opacity, Some(0.2));
        assert_eq!(style.extra["dashArray"], "4 2");
    }

    #[test]
    fn test_icon_options() {
        let icon: IconOptions = serde_json::from_value(serde_json::json!({
            "iconUrl": "https://example.com/fire.png",
            "iconSize": [32, 32],
            "iconAnchor": [16, 32],
            "popupAnchor": [0, -32],
        }))
        .unwrap();

        assert_eq!(icon.icon_size, Some([32, 32]));
        assert_eq!(icon.popup_anchor, Some([0, -32]));
    }
}
