//! Network access for the interceptor.
//!
//! ### Requests
//! - [`FetchRequest`] carries method, URL, headers and an optional body.
//!   Only the method, URL and `Accept` header take part in routing.
//!
//! ### Network
//! - [`Network`] is the single suspension point for network I/O. A fetch
//!   resolves with any HTTP status; only transport failures (no
//!   connectivity, DNS, TLS, timeout, oversized body) are errors.
//! - [`FetchClient`] is the reqwest implementation. Redirects are followed
//!   (max 5) and bodies are capped at `max_bytes`.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, is_network_scheme, resolve, resolve_http};
use ::url::Url;

use swcache_core::{AppConfig, Error, RequestKey, ResponseSnapshot};

/// A request as seen by the interceptor.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl FetchRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: Vec::new(), body: None }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Set a header, replacing any existing value of the same name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn accept(&self) -> Option<&str> {
        self.header("accept")
    }

    /// Store key for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.as_str(), &self.url)
    }

    /// Copy that asks every cache between here and the origin to revalidate.
    pub fn bypassing_cache(&self) -> Self {
        self.clone().with_header("Cache-Control", "no-cache")
    }
}

/// Source of network responses.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "swcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
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
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Network(format!("timed out: {}", err))
    } else {
        Error::Network(format!("network error: {}", err))
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, Error> {
        let start = Instant::now();

        let mut builder = self.http.request(request.method.clone(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| **name != header::CONTENT_LENGTH)
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(ResponseSnapshot {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "swcache/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app() {
        let app = AppConfig { timeout_ms: 1500, user_agent: "test-agent".into(), ..Default::default() };
        let config = FetchConfig::from_app(&app);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn test_request_headers() {
        let url = Url::parse("http://localhost:8000/api/x").unwrap();
        let request = FetchRequest::get(url)
            .with_header("Accept", "application/json")
            .with_header("accept", "text/html");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.accept(), Some("text/html"));
        assert_eq!(request.bypassing_cache().header("cache-control"), Some("no-cache"));
    }

    #[test]
    fn test_request_key_uses_method() {
        let url = Url::parse("http://localhost:8000/api/x").unwrap();
        let get = FetchRequest::get(url.clone()).key();
        let post = FetchRequest::new(Method::POST, url).key();
        assert_ne!(get, post);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = FetchClient::new(FetchConfig { timeout: Duration::from_millis(500), ..Default::default() })
            .unwrap();
        let request = FetchRequest::get(Url::parse("http://127.0.0.1:9/").unwrap());
        let err = client.fetch(&request).await.unwrap_err();
        assert!(err.is_network());
    }
}
