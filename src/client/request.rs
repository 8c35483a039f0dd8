//! # JSON HTTP Requests
//!
//! Single-attempt JSON requests over `reqwest`. There is no retry or backoff: one call,
//! one typed result. The transport enforces the timeout.
//!
//! Body handling is fixed: `None` sends no body at all, `Some(map)` (even an empty one)
//! sends the map serialized as JSON. `Content-Type: application/json; charset=utf-8` is
//! always set and may be overridden through [`HttpClient::set_header`].

use crate::core::error::{ToolkitError, ToolkitResult};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Timeout applied when none (or zero) is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Content type sent with every request
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Request body: a JSON object built from string keys
pub type JsonBody = HashMap<String, Value>;

/// Issue one JSON request and return the raw response body.
///
/// Equivalent to `HttpClient::new().set_url(url).set_method(method)` plus the body when given.
pub async fn request(url: &str, method: &str, body: Option<JsonBody>) -> ToolkitResult<Bytes> {
    let mut client = HttpClient::new().set_url(url).set_method(method);
    if let Some(body) = body {
        client = client.set_body(body);
    }
    client.execute().await
}

/// Fluent request descriptor, consumed by [`HttpClient::execute`]
///
/// ```rust,no_run
/// use service_toolkit::client::HttpClient;
/// use serde_json::json;
/// use std::collections::HashMap;
/// use std::time::Duration;
///
/// # async fn run() -> service_toolkit::ToolkitResult<()> {
/// let body = HttpClient::new()
///     .set_url("https://api.example.com/users")
///     .set_method("POST")
///     .set_body(HashMap::from([("name".to_string(), json!("bella"))]))
///     .set_timeout(Duration::from_secs(10))
///     .execute()
///     .await?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    url: String,
    method: String,
    body: Option<JsonBody>,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = url.into();
        self
    }

    /// HTTP method token; empty means `GET`
    pub fn set_method<S: Into<String>>(mut self, method: S) -> Self {
        self.method = method.into();
        self
    }

    pub fn set_body(mut self, body: JsonBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Replace the extra headers; applied after the default content type
    pub fn set_header(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Zero is treated as unset
    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Perform the request.
    ///
    /// # Errors
    /// - `InvalidInput`: empty or malformed URL, bad method token, bad header
    /// - `Encoding`: the body could not be serialized
    /// - `Transport`: connection failure, timeout, or failure reading the response
    /// - `UnexpectedStatus`: status outside [200, 299], with the raw body text
    #[instrument(skip(self), fields(url = %self.url, method = %self.method))]
    pub async fn execute(self) -> ToolkitResult<Bytes> {
        if self.url.is_empty() {
            return Err(ToolkitError::invalid_input("url is invalid"));
        }
        let url = Url::parse(&self.url)
            .map_err(|e| ToolkitError::invalid_input(format!("url is invalid: {}", e)))?;

        let method = if self.method.is_empty() {
            Method::GET
        } else {
            Method::from_bytes(self.method.as_bytes()).map_err(|_| {
                ToolkitError::invalid_input(format!("invalid method '{}'", self.method))
            })?
        };

        let timeout = self
            .timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(DEFAULT_TIMEOUT);

        let headers = self.build_headers()?;

        let payload = match &self.body {
            Some(body) => Some(serde_json::to_vec(body)?),
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ToolkitError::transport(format!("Failed to build HTTP client: {}", e)))?;

        let mut builder = client.request(method, url).headers(headers);
        if let Some(payload) = payload {
            builder = builder.body(payload);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Request failed");
            ToolkitError::transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ToolkitError::transport(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(ToolkitError::unexpected_status(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            ));
        }

        debug!(status = status.as_u16(), bytes = body.len(), "Request completed");
        Ok(body)
    }

    fn build_headers(&self) -> ToolkitResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ToolkitError::invalid_input(format!("invalid header name '{}'", name)))?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                ToolkitError::invalid_input(format!("invalid value for header '{}'", name))
            })?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}
