//! HTTP implementation of the fetch adapter

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geojson::FeatureCollection;
use log::debug;
use reqwest::Client;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use url::Url;

use crate::csrf::CSRF_HEADER;
use crate::csrf::CsrfTokenProvider;
use crate::error::FetchError;
use crate::model::Bounds;
use crate::model::TreeNodeDescriptor;
use crate::source::FeatureSource;
use crate::source::decode_feature_collection;
use crate::source::decode_tree;

/// Issues bounds-scoped POST requests against tree and layer endpoints.
///
/// Cheap to clone (uses `Arc` internally). Requests are never retried.
///
/// # Example
///
/// ```ignore
/// use maptree_lib::{FeatureClient, csrf::StaticCsrfToken};
///
/// let client = FeatureClient::builder()
///     .base_url("https://example.com")
///     .csrf(StaticCsrfToken::new(token))
///     .timeout(Duration::from_secs(30))
///     .build()?;
///
/// let features = client.fetch_features("/map/epm/granted/", &bounds).await?;
/// ```
#[derive(Clone)]
pub struct FeatureClient {
    inner: Arc<FeatureClientInner>,
}

struct FeatureClientInner {
    base_url: Url,
    csrf: Arc<dyn CsrfTokenProvider>,
    http_client: Client,
    timeout: Option<Duration>,
}

impl FeatureClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> FeatureClientBuilder<Missing, Missing> {
        FeatureClientBuilder::new()
    }

    /// Returns the base URL relative endpoint paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolves an endpoint path (absolute or relative) against the base URL.
    pub fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::InvalidUrl("empty URL".to_string()));
        }
        self.inner
            .base_url
            .join(url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))
    }

    fn default_headers(&self, token: &str) -> Result<HeaderMap, FetchError> {
        let token = HeaderValue::from_str(token).map_err(|e| FetchError::Csrf(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert(CSRF_HEADER, token);
        Ok(headers)
    }

    /// POSTs the bounds body to `url` and returns the raw response text.
    ///
    /// Fails with [`FetchError::Http`] on any non-2xx status.
    pub async fn post_bounds(&self, url: &str, bounds: &Bounds) -> Result<String, FetchError> {
        let target = self.resolve(url)?;
        let token = self.inner.csrf.csrf_token().await?;
        let headers = self.default_headers(&token)?;
        let body = serde_json::to_string(bounds).map_err(|e| FetchError::parse(e.to_string()))?;

        debug!("POST {} {}", target, body);

        let mut request = self
            .inner
            .http_client
            .post(target)
            .headers(headers)
            .body(body);

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(FetchError::http(status.as_u16(), text))
        }
    }
}

#[async_trait]
impl FeatureSource for FeatureClient {
    async fn fetch_features(
        &self,
        url: &str,
        bounds: &Bounds,
    ) -> Result<FeatureCollection, FetchError> {
        let body = self.post_bounds(url, bounds).await?;
        decode_feature_collection(&body)
    }

    async fn fetch_tree(
        &self,
        url: &str,
        bounds: &Bounds,
    ) -> Result<Vec<TreeNodeDescriptor>, FetchError> {
        let body = self.post_bounds(url, bounds).await?;
        decode_tree(&body)
    }
}

impl std::fmt::Debug for FeatureClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`FeatureClient`].
///
/// # Required Fields
///
/// - `base_url` - The origin relative endpoint paths are resolved against
/// - `csrf` - A [`CsrfTokenProvider`] implementation
pub struct FeatureClientBuilder<BaseUrl, Csrf> {
    base_url: BaseUrl,
    csrf: Csrf,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl FeatureClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: Missing,
            csrf: Missing,
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }
}

impl Default for FeatureClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> FeatureClientBuilder<Missing, C> {
    /// Sets the base URL.
    pub fn base_url(self, url: impl Into<String>) -> FeatureClientBuilder<Set<String>, C> {
        FeatureClientBuilder {
            base_url: Set(url.into()),
            csrf: self.csrf,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl<U> FeatureClientBuilder<U, Missing> {
    /// Sets the anti-forgery token provider.
    pub fn csrf<T: CsrfTokenProvider + 'static>(
        self,
        provider: T,
    ) -> FeatureClientBuilder<U, Set<Arc<dyn CsrfTokenProvider>>> {
        FeatureClientBuilder {
            base_url: self.base_url,
            csrf: Set(Arc::new(provider) as Arc<dyn CsrfTokenProvider>),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl<U, C> FeatureClientBuilder<U, C> {
    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// Ignored when a custom HTTP client is supplied.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl FeatureClientBuilder<Set<String>, Set<Arc<dyn CsrfTokenProvider>>> {
    /// Builds the [`FeatureClient`].
    ///
    /// Fails if the base URL cannot be parsed or the HTTP client cannot be created.
    pub fn build(self) -> Result<FeatureClient, FetchError> {
        let base_url = Url::parse(&self.base_url.0)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.base_url.0, e)))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(FeatureClient {
            inner: Arc::new(FeatureClientInner {
                base_url,
                csrf: self.csrf.0,
                http_client,
                timeout: self.timeout,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csrf::StaticCsrfToken;

    fn client() -> FeatureClient {
        FeatureClient::builder()
            .base_url("http://localhost:8000/app/")
            .csrf(StaticCsrfToken::new("token"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let client = client();
        assert_eq!(
            client.resolve("/roads").unwrap().as_str(),
            "http://localhost:8000/roads"
        );
        assert_eq!(
            client.resolve("layers/states").unwrap().as_str(),
            "http://localhost:8000/app/layers/states"
        );
        assert_eq!(
            client.resolve("https://tiles.example.com/x").unwrap().as_str(),
            "https://tiles.example.com/x"
        );
    }

    #[test]
    fn test_resolve_empty_url() {
        assert!(matches!(
            client().resolve("  "),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_build_rejects_bad_base_url() {
        let result = FeatureClient::builder()
            .base_url("not a url")
            .csrf(StaticCsrfToken::empty())
            .build();
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_csrf_header_rejects_control_characters() {
        let err = client().default_headers("bad\ntoken").unwrap_err();
        assert!(matches!(err, FetchError::Csrf(_)));
    }
}
