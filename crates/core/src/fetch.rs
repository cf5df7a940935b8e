//! HTTP transport used by every VNDB call.
//!
//! The pipeline only needs four verbs: fetch an HTML page as text, GET a
//! JSON document, POST a JSON query and download raw bytes (cover images).
//! They sit behind the [`Transport`] trait so the aggregator can run against
//! the real network through [`HttpTransport`] or, with the `test-util`
//! feature, against canned responses through `MemoryTransport`.

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::{Result, VnshelfError};

/// HTTP client configuration.
///
/// This struct controls timeout and user agent settings for HTTP requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: concat!("vnshelf/", env!("CARGO_PKG_VERSION")).to_string() }
    }
}

/// The network operations the aggregation pipeline depends on.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a page and return its body as text.
    async fn get_text(&self, url: &str) -> Result<String>;

    /// GET a JSON document.
    async fn get_json(&self, url: &str) -> Result<Value>;

    /// POST a JSON body and decode the JSON response.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>;

    /// GET raw bytes.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Parses and validates an absolute http(s) URL.
pub fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| VnshelfError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(VnshelfError::InvalidUrl(format!("unsupported scheme '{other}' in {url}"))),
    }
}

/// [`Transport`] backed by a shared reqwest client.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: FetchConfig,
}

#[cfg(feature = "fetch")]
impl HttpTransport {
    /// Builds the underlying client once; every request reuses it.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(VnshelfError::HttpError)?;

        Ok(Self { client, config })
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VnshelfError::Status { url: url.to_string(), status: status.as_u16() });
        }

        Ok(response)
    }

    /// Timeouts surface as [`VnshelfError::Timeout`], whether they hit while
    /// sending or while reading the body.
    fn request_error(&self, e: reqwest::Error) -> VnshelfError {
        if e.is_timeout() { VnshelfError::Timeout { timeout: self.config.timeout } } else { VnshelfError::HttpError(e) }
    }
}

#[cfg(feature = "fetch")]
#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!(url, "GET page");
        let request = self
            .client
            .get(parse_url(url)?)
            .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8");
        let response = self.send(request, url).await?;
        response.text().await.map_err(|e| self.request_error(e))
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        tracing::debug!(url, "GET json");
        let request = self.client.get(parse_url(url)?).header("Accept", "application/json");
        let response = self.send(request, url).await?;
        response.json::<Value>().await.map_err(|e| self.request_error(e))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        tracing::debug!(url, %body, "POST json");
        let request = self.client.post(parse_url(url)?).json(body);
        let response = self.send(request, url).await?;
        response.json::<Value>().await.map_err(|e| self.request_error(e))
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url, "GET bytes");
        let response = self.send(self.client.get(parse_url(url)?), url).await?;
        Ok(response.bytes().await.map_err(|e| self.request_error(e))?.to_vec())
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryTransport, RecordedCall};

#[cfg(any(test, feature = "test-util"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::Transport;
    use crate::{Result, VnshelfError};

    /// One request observed by a [`MemoryTransport`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub method: &'static str,
        pub url: String,
        pub body: Option<Value>,
    }

    type PostHandler = Box<dyn Fn(&Value) -> Value + Send + Sync>;

    /// In-memory [`Transport`] serving canned responses.
    ///
    /// Every request is recorded, whether or not a route answers it. Unrouted
    /// URLs fail with a 404 status error.
    #[derive(Default)]
    pub struct MemoryTransport {
        pages: HashMap<String, String>,
        documents: HashMap<String, Value>,
        blobs: HashMap<String, Vec<u8>>,
        posts: HashMap<String, PostHandler>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl MemoryTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Serves `body` for `get_text(url)`.
        pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.pages.insert(url.into(), body.into());
            self
        }

        /// Serves `document` for `get_json(url)`.
        pub fn with_json(mut self, url: impl Into<String>, document: Value) -> Self {
            self.documents.insert(url.into(), document);
            self
        }

        /// Serves `bytes` for `get_bytes(url)`.
        pub fn with_bytes(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
            self.blobs.insert(url.into(), bytes);
            self
        }

        /// Answers `post_json(url, body)` with `handler(body)`.
        pub fn with_post<F>(mut self, url: impl Into<String>, handler: F) -> Self
        where
            F: Fn(&Value) -> Value + Send + Sync + 'static,
        {
            self.posts.insert(url.into(), Box::new(handler));
            self
        }

        /// All requests seen so far, in order.
        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
        }

        fn record(&self, method: &'static str, url: &str, body: Option<&Value>) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(RecordedCall { method, url: url.to_string(), body: body.cloned() });
            }
        }

        fn not_found(url: &str) -> VnshelfError {
            VnshelfError::Status { url: url.to_string(), status: 404 }
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn get_text(&self, url: &str) -> Result<String> {
            self.record("GET", url, None);
            self.pages.get(url).cloned().ok_or_else(|| Self::not_found(url))
        }

        async fn get_json(&self, url: &str) -> Result<Value> {
            self.record("GET", url, None);
            self.documents.get(url).cloned().ok_or_else(|| Self::not_found(url))
        }

        async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
            self.record("POST", url, Some(body));
            self.posts.get(url).map(|handler| handler(body)).ok_or_else(|| Self::not_found(url))
        }

        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
            self.record("GET", url, None);
            self.blobs.get(url).cloned().ok_or_else(|| Self::not_found(url))
        }
    }
}
