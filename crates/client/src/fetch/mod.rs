//! Network transport.
//!
//! ### Contract
//! - Every upstream status code is a successful transport result; only
//!   connection, timeout and body-read failures are errors.
//! - Bodies are read completely (bounded by `max_bytes`) before a response is
//!   returned, so a partially read body can never reach the cache.
//!
//! ### Response tainting
//! - Same origin as the client: `basic`
//! - Cross origin with `Access-Control-Allow-Origin`: `cors`
//! - Any other cross-origin response: `opaque`

pub mod error;
pub mod url;

use async_trait::async_trait;
use pantry_core::{Request, Response, ResponseType};
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use error::TransportError;
pub use url::{UrlError, is_same_origin, resolve};

/// Anything able to put a request on the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, TransportError>;
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "pantry/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: none, the platform default applies)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Origin of the client, used to classify responses as basic/cors/opaque.
    pub origin: ::url::Url,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "pantry/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: None,
            max_redirects: 5,
            origin: ::url::Url::parse("http://localhost:5000").expect("static origin is valid"),
        }
    }
}

impl FetchConfig {
    pub fn from_app_config(config: &pantry_core::AppConfig) -> Result<Self, pantry_core::Error> {
        let origin = config
            .origin_url()
            .map_err(|e| pantry_core::Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: 5,
            origin,
        })
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    http: Client,
    config: FetchConfig,
}

impl HttpTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, TransportError> {
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
            .map_err(|e| TransportError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn response_type(&self, final_url: &::url::Url, headers: &header::HeaderMap) -> ResponseType {
        if is_same_origin(final_url, &self.config.origin) {
            ResponseType::Basic
        } else if headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN) {
            ResponseType::Cors
        } else {
            ResponseType::Opaque
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &Request) -> Result<Response, TransportError> {
        let start = Instant::now();

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(TransportError::TooLarge { len, limit: self.config.max_bytes });
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response.bytes().await.map_err(|e| TransportError::Body(e.to_string()))?;

        if bytes.len() > self.config.max_bytes {
            return Err(TransportError::TooLarge { len: bytes.len() as u64, limit: self.config.max_bytes });
        }

        let response_type = self.response_type(&final_url, &headers);
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            final_url = %final_url,
            status = status.as_u16(),
            response_type = %response_type,
            fetch_ms,
            bytes = bytes.len(),
            "fetched from network"
        );

        Ok(Response {
            url: Some(final_url),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: headers
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
                .collect(),
            body: bytes,
            response_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "pantry/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = pantry_core::AppConfig { timeout_ms: Some(1500), ..Default::default() };
        let config = FetchConfig::from_app_config(&app).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.origin.as_str(), "http://localhost:5000/");
    }

    #[test]
    fn test_response_tainting() {
        let transport = HttpTransport::new(FetchConfig::default()).unwrap();
        let mut headers = header::HeaderMap::new();

        let same = ::url::Url::parse("http://localhost:5000/static/app.js").unwrap();
        assert_eq!(transport.response_type(&same, &headers), ResponseType::Basic);

        let cdn = ::url::Url::parse("https://cdn.jsdelivr.net/npm/x.js").unwrap();
        assert_eq!(transport.response_type(&cdn, &headers), ResponseType::Opaque);

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, header::HeaderValue::from_static("*"));
        assert_eq!(transport.response_type(&cdn, &headers), ResponseType::Cors);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = HttpTransport::new(FetchConfig {
            timeout: Some(Duration::from_secs(2)),
            ..Default::default()
        })
        .unwrap();
        // port 9 (discard) on loopback is closed in test environments
        let req = Request::get(::url::Url::parse("http://127.0.0.1:9/").unwrap());
        let result = transport.fetch(&req).await;
        assert!(result.is_err());
    }
}
