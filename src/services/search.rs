//! # Search Service Client
//!
//! A thin Elasticsearch REST client built on `reqwest`: cluster info, index creation,
//! aliases, a multi-field full-text search and index existence checks.
//!
//! ## Key Features
//!
//! - Basic or API-key authentication, plus fixed extra headers on every request
//! - Round-robin over the configured node addresses (no retries)
//! - Non-2xx answers become `ToolkitError::UnexpectedStatus` with the raw body,
//!   except `404` from [`SearchClient::exists`], which means "no"
//! - Optional request/response body logging

use crate::core::error::{ToolkitError, ToolkitResult};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const ALIAS_TIMEOUT: Duration = Duration::from_secs(3);
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Node base URLs, e.g. `http://localhost:9200`
    pub addresses: Vec<String>,
    pub username: String,
    pub password: String,
    /// Takes precedence over username/password when set
    pub api_key: String,
    /// Sent with every request
    pub headers: HashMap<String, String>,
    pub enable_logging: bool,
    /// Zero means [`DEFAULT_SEARCH_TIMEOUT`]
    pub timeout: Duration,
}

/// `{"query": {"bool": {"must": [{"multi_match": {...}}]}}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiMatchQuery {
    pub query: BoolQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoolQuery {
    pub bool: MustClause,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MustClause {
    pub must: Vec<Value>,
}

impl MultiMatchQuery {
    pub fn new(term: &str, fields: &[String]) -> Self {
        Self {
            query: BoolQuery {
                bool: MustClause {
                    must: vec![serde_json::json!({
                        "multi_match": { "query": term, "fields": fields }
                    })],
                },
            },
        }
    }
}

/// Typed view of a search response: total hit count and the `_source` documents
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHits<T> {
    pub hits: HitsEnvelope<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitsEnvelope<T> {
    pub total: HitsTotal,
    pub hits: Vec<Hit<T>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HitsTotal {
    pub value: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hit<T> {
    #[serde(rename = "_source")]
    pub source: T,
}

impl<T> SearchHits<T> {
    pub fn total(&self) -> i64 {
        self.hits.total.value
    }

    pub fn into_sources(self) -> Vec<T> {
        self.hits.hits.into_iter().map(|hit| hit.source).collect()
    }
}

pub struct SearchClient {
    nodes: Vec<Url>,
    next_node: AtomicUsize,
    client: reqwest::Client,
    credentials: Option<(String, String)>,
    timeout: Duration,
    enable_logging: bool,
}

impl SearchClient {
    pub fn new(config: SearchConfig) -> ToolkitResult<Self> {
        if config.addresses.is_empty() {
            return Err(ToolkitError::invalid_input(
                "at least one search node address is required",
            ));
        }

        let nodes = config
            .addresses
            .iter()
            .map(|address| {
                Url::parse(address).map_err(|e| {
                    ToolkitError::invalid_input(format!("Invalid node address '{}': {}", address, e))
                })
            })
            .collect::<ToolkitResult<Vec<_>>>()?;

        let timeout = if config.timeout.is_zero() {
            DEFAULT_SEARCH_TIMEOUT
        } else {
            config.timeout
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers(&config)?)
            .build()?;

        let credentials = (config.api_key.is_empty() && !config.username.is_empty())
            .then(|| (config.username.clone(), config.password.clone()));

        Ok(Self {
            nodes,
            next_node: AtomicUsize::new(0),
            client,
            credentials,
            timeout,
            enable_logging: config.enable_logging,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cluster information (`GET /`)
    pub async fn info(&self) -> ToolkitResult<Value> {
        let (status, body) = self
            .send(Method::GET, &[], &[("human", "true".to_string())], None, None)
            .await?;
        into_json(status, body)
    }

    /// Create index `name` with the given settings/mappings body
    #[instrument(skip(self, body))]
    pub async fn create_index(&self, name: &str, body: &Value) -> ToolkitResult<Value> {
        require_name(name)?;
        let (status, body) = self
            .send(
                Method::PUT,
                &[name],
                &[("timeout", timeout_param(self.timeout))],
                Some(body),
                None,
            )
            .await?;
        into_json(status, body)
    }

    /// Point alias `name` at `indexes`
    #[instrument(skip(self, body))]
    pub async fn put_alias(
        &self,
        indexes: &[String],
        name: &str,
        body: Option<&Value>,
    ) -> ToolkitResult<Value> {
        let target = index_list(indexes)?;
        require_name(name)?;
        let (status, body) = self
            .send(
                Method::PUT,
                &[target.as_str(), "_alias", name],
                &[("timeout", timeout_param(ALIAS_TIMEOUT))],
                body,
                Some(ALIAS_TIMEOUT),
            )
            .await?;
        into_json(status, body)
    }

    /// Full-text search for `term` across `fields` of `index`
    #[instrument(skip(self))]
    pub async fn search(&self, index: &str, term: &str, fields: &[String]) -> ToolkitResult<Value> {
        require_name(index)?;
        let query = serde_json::to_value(MultiMatchQuery::new(term, fields))?;
        let (status, body) = self
            .send(
                Method::POST,
                &[index, "_search"],
                &[("timeout", timeout_param(QUERY_TIMEOUT))],
                Some(&query),
                Some(QUERY_TIMEOUT),
            )
            .await?;
        into_json(status, body)
    }

    /// [`SearchClient::search`] decoded into `_source` documents of type `T`
    pub async fn search_hits<T: DeserializeOwned>(
        &self,
        index: &str,
        term: &str,
        fields: &[String],
    ) -> ToolkitResult<SearchHits<T>> {
        let value = self.search(index, term, fields).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Whether every index in `indexes` exists; `404` is a normal "false"
    pub async fn exists(&self, indexes: &[String]) -> ToolkitResult<bool> {
        let target = index_list(indexes)?;
        let (status, body) = self.send(Method::HEAD, &[target.as_str()], &[], None, None).await?;

        if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else if status.is_success() {
            Ok(true)
        } else {
            Err(ToolkitError::unexpected_status(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            ))
        }
    }

    fn node(&self) -> &Url {
        let index = self.next_node.fetch_add(1, Ordering::Relaxed) % self.nodes.len();
        &self.nodes[index]
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> ToolkitResult<(StatusCode, Bytes)> {
        let mut url = self.node().clone();
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| ToolkitError::invalid_input("node address cannot be a base URL"))?
                .pop_if_empty()
                .extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        if self.enable_logging {
            info!(method = %method, url = %url, body = ?body, "Search request");
        }

        let response = request
            .send()
            .await
            .map_err(|e| ToolkitError::transport(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ToolkitError::transport(format!("Failed to read response body: {}", e)))?;

        if self.enable_logging {
            info!(status = status.as_u16(), body = %String::from_utf8_lossy(&bytes), "Search response");
        } else {
            debug!(method = %method, url = %url, status = status.as_u16(), "Search request completed");
        }

        Ok((status, bytes))
    }
}

fn default_headers(config: &SearchConfig) -> ToolkitResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if !config.api_key.is_empty() {
        let value = HeaderValue::from_str(&format!("ApiKey {}", config.api_key))
            .map_err(|_| ToolkitError::invalid_input("api key contains invalid characters"))?;
        headers.insert(AUTHORIZATION, value);
    }

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ToolkitError::invalid_input(format!("invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            ToolkitError::invalid_input(format!("invalid value for header '{}'", name))
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}

fn require_name(name: &str) -> ToolkitResult<()> {
    if name.trim().is_empty() {
        return Err(ToolkitError::invalid_input("index name is required"));
    }
    Ok(())
}

fn index_list(indexes: &[String]) -> ToolkitResult<String> {
    if indexes.is_empty() || indexes.iter().any(|index| index.trim().is_empty()) {
        return Err(ToolkitError::invalid_input("index names must not be empty"));
    }
    Ok(indexes.join(","))
}

fn timeout_param(timeout: Duration) -> String {
    format!("{}ms", timeout.as_millis())
}

fn into_json(status: StatusCode, body: Bytes) -> ToolkitResult<Value> {
    if !status.is_success() {
        return Err(ToolkitError::unexpected_status(
            status.as_u16(),
            String::from_utf8_lossy(&body),
        ));
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)?)
}
