//! HTTP fetch pipeline behind the cache policy.
//!
//! ### Fetcher seam
//! - [`Fetcher`] is the only way the cache policy reaches the network, so the
//!   policy can be driven by a stub in tests.
//! - An `Err` means no response was produced at all (DNS, connect, TLS,
//!   reset). HTTP error statuses are still responses.
//!
//! ### Response classification
//! - Responses whose final URL stays on the configured site origin are
//!   `basic`.
//! - Cross-origin responses are `cors`, or `opaque` for `no-cors` requests.
//! - `redirected` is set when the final URL differs from the requested one.

pub mod url;

use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, is_ignored_scheme, resolve, same_document};

use swcache_core::{Error, Request, RequestMode, Response, ResponseType};

/// Network access used by the cache policy.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request against the network.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Site origin used to classify responses as basic.
    pub origin: Option<::url::Url>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "swcache/0.1".to_string(), timeout: None, max_redirects: 5, origin: None }
    }
}

/// HTTP fetch client backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn classify(&self, request: &Request, final_url: &::url::Url) -> ResponseType {
        let on_site = self
            .config
            .origin
            .as_ref()
            .is_some_and(|origin| request.is_same_origin(origin) && final_url.origin() == origin.origin());

        if on_site {
            ResponseType::Basic
        } else if request.mode == RequestMode::NoCors {
            ResponseType::Opaque
        } else {
            ResponseType::Cors
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("network error: {}", e)))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = header_pairs(response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        let response_type = self.classify(request, &final_url);
        let redirected = !same_document(&final_url, &request.url);

        tracing::debug!(
            "fetched {} -> {} {} in {}ms ({} bytes, {})",
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len(),
            response_type
        );

        let mut out = Response::new(status.as_u16(), bytes.to_vec())
            .with_url(final_url.to_string())
            .with_status_text(status.canonical_reason().unwrap_or(""))
            .with_type(response_type)
            .with_redirected(redirected);
        out.headers = headers;

        Ok(out)
    }
}

fn header_pairs(map: &header::HeaderMap) -> Vec<(String, String)> {
    map.iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> ::url::Url {
        ::url::Url::parse(s).unwrap()
    }

    fn client_for(origin: &str) -> FetchClient {
        FetchClient::new(FetchConfig { origin: Some(url(origin)), ..Default::default() }).unwrap()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "swcache/0.1");
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_redirects, 5);
        assert!(config.origin.is_none());
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let config = FetchConfig { timeout: Some(Duration::from_secs(5)), ..Default::default() };
        assert!(FetchClient::new(config).is_ok());
    }

    #[tokio::test]
    async fn test_classify_same_origin_is_basic() {
        let client = client_for("https://portfolio.example");
        let req = Request::get(url("https://portfolio.example/app.js"));
        assert_eq!(client.classify(&req, &req.url), ResponseType::Basic);
    }

    #[tokio::test]
    async fn test_classify_redirect_off_site_is_cors() {
        let client = client_for("https://portfolio.example");
        let req = Request::get(url("https://portfolio.example/go"));
        assert_eq!(client.classify(&req, &url("https://elsewhere.example/")), ResponseType::Cors);
    }

    #[tokio::test]
    async fn test_classify_cross_origin_no_cors_is_opaque() {
        let client = client_for("https://portfolio.example");
        let mut req = Request::get(url("https://images.example/photo.jpg"));
        req.mode = RequestMode::NoCors;
        assert_eq!(client.classify(&req, &req.url), ResponseType::Opaque);
    }

    #[tokio::test]
    async fn test_classify_without_origin_is_never_basic() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let req = Request::get(url("https://portfolio.example/"));
        assert_eq!(client.classify(&req, &req.url), ResponseType::Cors);
    }

    #[test]
    fn test_header_pairs() {
        let mut map = header::HeaderMap::new();
        map.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/css"));
        let pairs = header_pairs(&map);
        assert_eq!(pairs, vec![("content-type".to_string(), "text/css".to_string())]);
    }
}
