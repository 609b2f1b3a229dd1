//! Anti-forgery token providers

use async_trait::async_trait;

use crate::error::FetchError;

/// Header every POST carries the anti-forgery token in.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Supplies the anti-forgery token sent with every request.
///
/// The host page owns the token (typically a hidden form field rendered by
/// the server). The client asks for it before each request so a host may
/// rotate it between requests.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use maptree_lib::csrf::CsrfTokenProvider;
/// use maptree_lib::error::FetchError;
///
/// struct CookieToken {
///     jar: MyCookieJar,
/// }
///
/// #[async_trait]
/// impl CsrfTokenProvider for CookieToken {
///     async fn csrf_token(&self) -> Result<String, FetchError> {
///         self.jar
///             .get("csrftoken")
///             .ok_or_else(|| FetchError::Csrf("cookie not set".to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait CsrfTokenProvider: Send + Sync {
    /// Returns the current token.
    async fn csrf_token(&self) -> Result<String, FetchError>;
}

/// A provider that always returns the same token.
///
/// # Example
///
/// ```
/// use maptree_lib::csrf::StaticCsrfToken;
///
/// let provider = StaticCsrfToken::new("abc123");
/// ```
#[derive(Debug, Clone)]
pub struct StaticCsrfToken {
    token: String,
}

impl StaticCsrfToken {
    /// Creates a provider for a fixed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Creates a provider that sends an empty token.
    ///
    /// Useful against endpoints that are exempt from CSRF checks.
    pub fn empty() -> Self {
        Self {
            token: String::new(),
        }
    }
}

#[async_trait]
impl CsrfTokenProvider for StaticCsrfToken {
    async fn csrf_token(&self) -> Result<String, FetchError> {
        Ok(self.token.clone())
    }
}
