//! # Router Abstraction
//!
//! A [`Router`] is a builder for a small HTTP service: the application registers its own
//! paths on a concrete backend, switches on the built-in features it wants, then calls
//! [`Router::serve_http`], which blocks until SIGINT/SIGTERM and shuts down gracefully.
//!
//! ## Rust Concepts Used
//!
//! - `#[async_trait]` so the trait can carry async serving methods
//! - Consuming `self` builders (`fn allow_cors(self) -> Self`) for fluent chaining
//! - A shared [`RouterOptions`] struct so both backends agree on flag semantics
//!
//! Feature semantics common to every backend:
//!
//! - the prefix is prepended to user paths only; `/health` is always served unprefixed
//! - middleware runs logger → CORS → recovery → handler, whatever order the flags were set
//! - registering the same path twice keeps the last registration
//! - every full path is checked with `matchit` (the matcher axum uses) before serving, so a
//!   conflicting or malformed template is an `InvalidInput` error instead of a panic

use crate::core::error::{ToolkitError, ToolkitResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub const HEALTH_PATH: &str = "/health";
pub const HEALTH_MESSAGE: &str = "service is running";

/// Deadline for in-flight requests once shutdown begins
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait Router: Send + Sized {
    /// Prefix for user routes, e.g. `/v1`
    fn add_prefix<S: Into<String>>(self, prefix: S) -> Self;

    /// Convert handler panics into `500` JSON errors
    fn allow_recovery(self) -> Self;

    /// Log one line per request
    fn allow_log(self) -> Self;

    /// Serve `GET /health`
    fn allow_health_check(self) -> Self;

    /// Permissive CORS for every route
    fn allow_cors(self) -> Self;

    /// Bind `0.0.0.0:<port>` and serve until a shutdown signal arrives
    async fn serve_http(self) -> ToolkitResult<()>;

    /// Every built-in feature on, then serve
    async fn default(self) -> ToolkitResult<()> {
        self.allow_cors()
            .allow_health_check()
            .allow_log()
            .allow_recovery()
            .serve_http()
            .await
    }
}

/// Feature flags and addressing shared by the backends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterOptions {
    pub port: String,
    pub prefix: String,
    pub health_check: bool,
    pub log_request: bool,
    pub cors: bool,
    pub recovery: bool,
}

impl RouterOptions {
    pub fn new<S: Into<String>>(port: S) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Full path of a user route
    pub fn route_path(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path)
    }
}

/// `"v1/"` → `"/v1"`, `"/"` → `""`
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Prefixes are literal: no parameters or wildcards
pub fn validate_prefix(prefix: &str) -> ToolkitResult<()> {
    match prefix.find(['*', ':', '{', '}']) {
        Some(_) => Err(ToolkitError::invalid_input(format!(
            "prefix '{}' cannot contain parameters or wildcards",
            prefix
        ))),
        None => Ok(()),
    }
}

/// Insert every full path into one `matchit` table, reporting all rejected paths
pub fn validate_paths<'a, I>(paths: I) -> ToolkitResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut matcher = matchit::Router::new();
    let problems: Vec<String> = paths
        .into_iter()
        .filter_map(|path| {
            matcher
                .insert(path, ())
                .err()
                .map(|e| format!("invalid route '{}': {}", path, e))
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ToolkitError::invalid_input(problems.join("; ")))
    }
}

pub fn health_body() -> Value {
    json!({ "message": HEALTH_MESSAGE })
}
