//! Error types

mod config;
mod fetch;

pub use config::*;
pub use fetch::*;

/// Any error produced by the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request to a tree or layer endpoint failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The map or layer configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification of a failure that was logged and swallowed.
///
/// Toggle and load paths never return errors to their callers. The kind of
/// the failure is kept so hosts and tests can still inspect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// The request could not be sent or the server answered with a non-2xx status.
    Network,
    /// The response body was not valid JSON or not the expected shape.
    Parse,
    /// The layer has no data URL, or the configuration was rejected.
    Config,
}

impl From<&FetchError> for LoadError {
    fn from(err: &FetchError) -> Self {
        if err.is_parse() {
            LoadError::Parse
        } else if matches!(err, FetchError::InvalidUrl(_)) {
            LoadError::Config
        } else {
            LoadError::Network
        }
    }
}

impl From<&Error> for LoadError {
    fn from(err: &Error) -> Self {
        match err {
            Error::Fetch(e) => LoadError::from(e),
            Error::Config(_) => LoadError::Config,
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoadError::Network => "network",
            LoadError::Parse => "parse",
            LoadError::Config => "config",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_classification() {
        assert_eq!(
            LoadError::from(&FetchError::http(500, "boom")),
            LoadError::Network
        );
        assert_eq!(
            LoadError::from(&FetchError::parse("not json")),
            LoadError::Parse
        );
        assert_eq!(
            LoadError::from(&FetchError::InvalidUrl("::".to_string())),
            LoadError::Config
        );
        let err = Error::from(ConfigError::MissingSource {
            label: "Fire".to_string(),
        });
        assert_eq!(LoadError::from(&err), LoadError::Config);
    }
}
