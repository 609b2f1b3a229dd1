//! Configuration error types

/// Errors raised by invalid map or layer configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A tree leaf has neither children nor a data URL.
    #[error("Layer '{label}' has no data URL")]
    MissingSource { label: String },

    /// A data or tree URL is present but empty.
    #[error("Empty URL")]
    EmptyUrl,

    /// `min_zoom` is greater than `max_zoom`.
    #[error("Invalid zoom range: min {min} > max {max}")]
    InvalidZoom { min: u8, max: u8 },

    /// The initial zoom level lies outside the allowed range.
    #[error("Zoom level {zoom} outside [{min}, {max}]")]
    ZoomOutOfRange { zoom: u8, min: u8, max: u8 },

    /// A coordinate is not finite or lies outside latitude/longitude limits.
    #[error("Invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },
}
