//! HTTP call wrapper shared by providers and IP sources
//!
//! [`ApiClient`] owns the base URL, the optional bearer token and the
//! [`RetryPolicy`]. Each [`ApiRequest`] is relative to the base URL; the
//! client adds JSON headers and auth, classifies the status, retries
//! transient failures and decodes the body.
//!
//! ```text
//! ApiRequest ──► headers/auth ──► send ──► status < 400? ──► decode T
//!                                   ▲           │ no
//!                                   └─ retry ◄──┘ (status >= 429)
//! ```
//!
//! An `ApiClient` is read-only after construction and is shared by every
//! concurrent upsert.

use crate::error::{Error, Result};
use crate::retry::{RetryPolicy, retry};
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest response body excerpt carried in an [`Error::Api`]
const MAX_ERROR_BODY: usize = 512;

/// A request relative to an [`ApiClient`]'s base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Create a request with an arbitrary method
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// `GET path`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PATCH path`
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter only when `value` is present
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Wrapper around `reqwest::Client` with base URL, auth and retry
#[derive(Clone)]
pub struct ApiClient {
    name: &'static str,
    base_url: String,
    bearer_token: Option<String>,
    retry_policy: RetryPolicy,
    http: reqwest::Client,
}

// Custom Debug implementation that hides the bearer token
impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl ApiClient {
    /// Start building a client named `name` (used in errors and logs)
    pub fn builder(name: &'static str, base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            name,
            base_url: base_url.into(),
            bearer_token: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Base URL every request path is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry policy applied to every request
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Send `request` and decode the response body as `T`
    ///
    /// Decoding failures surface as [`Error::Decode`] and are never retried.
    pub async fn invoke<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::http(format!("Failed to read response body: {}", e)))?;

        serde_json::from_slice(&bytes).map_err(|e| Error::decode(self.name, e.to_string()))
    }

    /// Send `request` and discard the response body
    pub async fn invoke_empty(&self, request: &ApiRequest) -> Result<()> {
        self.send(request).await.map(drop)
    }

    /// Send with retries; returns the first response with an ok status
    async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let label = format!("{} {}", self.name, request.label());
        retry(&self.retry_policy, &label, || self.send_once(request)).await
    }

    /// One attempt: build, send and classify
    async fn send_once(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(
            client = self.name,
            method = %request.method,
            path = %request.path,
            "Sending request"
        );

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header(ACCEPT, "application/json");

        if let Some(ref token) = self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", self.name, e)))?;

        let status = response.status();
        if status.as_u16() < 400 {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(Error::api(self.name, status.as_u16(), truncate(body)))
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    name: &'static str,
    base_url: String,
    bearer_token: Option<String>,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl ApiClientBuilder {
    /// Authenticate every request with `Authorization: Bearer <token>`
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient> {
        if self.base_url.is_empty() {
            return Err(Error::config(format!("{} base URL cannot be empty", self.name)));
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("ddns/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ApiClient {
            name: self.name,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            bearer_token: self.bearer_token,
            retry_policy: self.retry_policy,
            http,
        })
    }
}
