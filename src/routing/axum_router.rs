//! # Axum Router Backend
//!
//! [`AxumRouter`] builds an `axum::Router` out of the registered paths and the enabled
//! built-in features, then serves it with graceful shutdown.
//!
//! ## Key Features
//!
//! - Request logging via `tower_http::trace::TraceLayer`, remote address from `ConnectInfo`
//! - CORS through an `axum::middleware::from_fn` middleware that answers every `OPTIONS`
//! - Response compression for clients that ask for it
//! - Panic recovery via `tower_http::catch_panic::CatchPanicLayer`, user routes only
//!
//! ```rust,no_run
//! use axum::http::Method;
//! use service_toolkit::routing::{AxumRouter, Router};
//!
//! # async fn run() -> service_toolkit::ToolkitResult<()> {
//! AxumRouter::new("8080")
//!     .add_path("/users", Method::GET, || async { "[]" })
//!     .add_prefix("v1")
//!     .default()
//!     .await
//! # }
//! ```

use crate::core::error::{ToolkitError, ToolkitResult};
use crate::middleware::{cors_middleware, panic_response, trace_layer};
use crate::routing::router::{
    health_body, normalize_prefix, validate_paths, validate_prefix, Router, RouterOptions,
    HEALTH_PATH, SHUTDOWN_TIMEOUT,
};
use crate::routing::shutdown::{run_until_signal, shutdown_signal};
use async_trait::async_trait;
use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{get, on, MethodFilter, MethodRouter};
use axum::Json;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tracing::{debug, info, instrument, warn};

pub struct AxumRouter {
    options: RouterOptions,
    routes: HashMap<String, MethodRouter>,
    invalid: Vec<String>,
}

impl AxumRouter {
    pub fn new<S: Into<String>>(port: S) -> Self {
        Self {
            options: RouterOptions::new(port),
            routes: HashMap::new(),
            invalid: Vec::new(),
        }
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Register `handler` for `method` on `path` (relative to the prefix).
    ///
    /// A later registration for the same path replaces the earlier one, whatever its
    /// method. Paths that do not start with `/` and methods axum cannot route are
    /// reported by [`AxumRouter::into_app`].
    pub fn add_path<H, T>(mut self, path: &str, method: Method, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        if !path.starts_with('/') {
            self.invalid.push(format!("path '{}' must start with '/'", path));
            return self;
        }

        match MethodFilter::try_from(method.clone()) {
            Ok(filter) => {
                if self.routes.insert(path.to_string(), on(filter, handler)).is_some() {
                    debug!(path, method = %method, "Replaced existing route");
                }
            }
            Err(_) => self
                .invalid
                .push(format!("unsupported method '{}' for path '{}'", method, path)),
        }
        self
    }

    /// Assemble the application without serving it
    pub fn into_app(self) -> ToolkitResult<axum::Router> {
        if !self.invalid.is_empty() {
            return Err(ToolkitError::invalid_input(self.invalid.join("; ")));
        }
        let options = self.options;
        validate_prefix(&options.prefix)?;

        let mut routes = self.routes;
        if options.health_check && options.prefix.is_empty() && routes.remove(HEALTH_PATH).is_some()
        {
            warn!(path = HEALTH_PATH, "Built-in health check replaces user route");
        }

        // axum panics on paths its matcher rejects, so check them all first
        let mut full_paths: Vec<String> = routes
            .keys()
            .map(|path| nested_path(&options, path))
            .collect();
        if options.health_check {
            full_paths.push(HEALTH_PATH.to_string());
        }
        validate_paths(full_paths.iter().map(String::as_str))?;

        let mut user = axum::Router::new();
        for (path, route) in routes {
            user = user.route(&path, route);
        }
        if options.recovery {
            user = user.layer(CatchPanicLayer::custom(panic_response));
        }

        let mut app = axum::Router::new();
        if options.health_check {
            app = app.route(HEALTH_PATH, get(health_check));
        }
        app = if options.prefix.is_empty() {
            app.merge(user)
        } else {
            app.nest(&options.prefix, user)
        };

        // Each layer wraps the previous ones, so the last added runs first.
        app = app.layer(CompressionLayer::new());
        if options.cors {
            app = app.layer(axum::middleware::from_fn(cors_middleware));
        }
        if options.log_request {
            app = app.layer(trace_layer());
        }

        Ok(app)
    }

    /// Serve on an already bound listener until `signal` resolves
    #[instrument(skip_all)]
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, signal: F) -> ToolkitResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        let app = self.into_app()?;
        let addr = listener.local_addr()?;
        info!(addr = %addr, "🚀 HTTP server listening");

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
            .map_err(|e| ToolkitError::server(format!("HTTP server error: {}", e)))
        });

        run_until_signal(server, stop_tx, signal, SHUTDOWN_TIMEOUT).await
    }
}

#[async_trait]
impl Router for AxumRouter {
    fn add_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.options.prefix = normalize_prefix(&prefix.into());
        self
    }

    fn allow_recovery(mut self) -> Self {
        self.options.recovery = true;
        self
    }

    fn allow_log(mut self) -> Self {
        self.options.log_request = true;
        self
    }

    fn allow_health_check(mut self) -> Self {
        self.options.health_check = true;
        self
    }

    fn allow_cors(mut self) -> Self {
        self.options.cors = true;
        self
    }

    async fn serve_http(self) -> ToolkitResult<()> {
        let address = self.options.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| ToolkitError::server(format!("Failed to bind {}: {}", address, e)))?;

        self.serve_with_shutdown(listener, shutdown_signal()).await
    }
}

/// Path a user route ends up at once nested under the prefix
fn nested_path(options: &RouterOptions, path: &str) -> String {
    if path == "/" && !options.prefix.is_empty() {
        options.prefix.clone()
    } else {
        options.route_path(path)
    }
}

async fn health_check() -> Json<Value> {
    Json(health_body())
}
