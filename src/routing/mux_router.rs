//! # Hyper Router Backend
//!
//! [`MuxRouter`] serves a path-keyed route table directly on `hyper` 1.x, with no
//! framework in between. Paths may be templates: `{name}` (or `:name`) matches one
//! segment and `*name` the rest of the path; matched values reach the handler as
//! [`PathParams`] in the request extensions. Middleware is applied by hand in
//! [`MuxApp::dispatch`]:
//!
//! 1. log the request (remote address, method, URI)
//! 2. CORS: add the three headers to every response and answer any `OPTIONS` with an empty `200`
//! 3. match the path: `404 {"error":"not found"}` when absent, `405` on a method mismatch
//! 4. run the handler, catching panics as `500 {"error":"recovering from err ..."}`
//!
//! Request bodies are collected before dispatch, so handlers receive `Request<Bytes>`.
//!
//! ## Rust Concepts Used
//!
//! - `Arc<dyn Fn(..) -> BoxFuture<..>>` for type-erased async handlers
//! - `futures::FutureExt::catch_unwind` to turn handler panics into responses
//! - `hyper_util::server::graceful::GracefulShutdown` to drain open connections

use crate::core::error::{ToolkitError, ToolkitResult};
use crate::middleware::{apply_cors_headers, log_request, recovery_body, remote_addr};
use crate::routing::router::{
    health_body, normalize_prefix, validate_prefix, Router, RouterOptions, HEALTH_PATH,
    SHUTDOWN_TIMEOUT,
};
use crate::routing::shutdown::{run_until_signal, shutdown_signal};
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, info, instrument, warn};

pub const QUIT_PATH: &str = "/quit";

pub type MuxRequest = Request<Bytes>;
pub type MuxResponse = Response<Full<Bytes>>;
pub type MuxHandler = Arc<dyn Fn(MuxRequest) -> BoxFuture<'static, MuxResponse> + Send + Sync>;

#[derive(Clone)]
struct MuxRoute {
    method: Method,
    handler: MuxHandler,
}

/// Values captured by a templated route, in path order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `/users/{id}` → `/users/:id`. Native `:name` and `*name` segments pass through.
fn matcher_template(path: &str) -> Result<String, String> {
    path.split('/')
        .map(|segment| {
            if !segment.contains(['{', '}']) {
                return Ok(segment.to_string());
            }
            let name = segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
                .ok_or_else(|| format!("parameter in '{}' must span the whole segment", path))?;
            if name.is_empty() || name.contains(['{', '}']) {
                return Err(format!("parameter in '{}' must be named", path));
            }
            if name.contains(':') {
                return Err(format!("pattern constraints in '{}' are not supported", path));
            }
            Ok(format!(":{}", name))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|segments| segments.join("/"))
}

pub struct MuxRouter {
    options: RouterOptions,
    quit: bool,
    routes: HashMap<String, MuxRoute>,
    invalid: Vec<String>,
}

impl MuxRouter {
    pub fn new<S: Into<String>>(port: S) -> Self {
        Self {
            options: RouterOptions::new(port),
            quit: false,
            routes: HashMap::new(),
            invalid: Vec::new(),
        }
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Register `handler` for `method` on `path` (relative to the prefix).
    /// A later registration for the same path replaces the earlier one.
    pub fn add_path<F, Fut>(mut self, path: &str, method: Method, handler: F) -> Self
    where
        F: Fn(MuxRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MuxResponse> + Send + 'static,
    {
        if !path.starts_with('/') {
            self.invalid.push(format!("path '{}' must start with '/'", path));
            return self;
        }

        let handler: MuxHandler =
            Arc::new(move |request: MuxRequest| -> BoxFuture<'static, MuxResponse> {
                Box::pin(handler(request))
            });
        if self
            .routes
            .insert(path.to_string(), MuxRoute { method, handler })
            .is_some()
        {
            debug!(path, "Replaced existing route");
        }
        self
    }

    /// Serve `POST /quit`, which answers `OK` and then stops the server gracefully
    pub fn allow_quit(mut self) -> Self {
        self.quit = true;
        self
    }

    /// Assemble the route table without serving it
    pub fn into_app(self) -> ToolkitResult<MuxApp> {
        if !self.invalid.is_empty() {
            return Err(ToolkitError::invalid_input(self.invalid.join("; ")));
        }
        validate_prefix(&self.options.prefix)?;

        let mut routes: HashMap<String, MuxRoute> = self
            .routes
            .into_iter()
            .map(|(path, route)| (self.options.route_path(&path), route))
            .collect();

        if self.options.health_check {
            let replaced = routes.insert(
                HEALTH_PATH.to_string(),
                MuxRoute {
                    method: Method::GET,
                    handler: Arc::new(|_: MuxRequest| {
                        async { mux_json(StatusCode::OK, &health_body()) }.boxed()
                    }),
                },
            );
            if replaced.is_some() {
                warn!(path = HEALTH_PATH, "Built-in health check replaces user route");
            }
        }

        let quit = self.quit.then(|| Arc::new(Notify::new()));
        if let Some(notify) = &quit {
            let notify = Arc::clone(notify);
            let replaced = routes.insert(
                QUIT_PATH.to_string(),
                MuxRoute {
                    method: Method::POST,
                    handler: Arc::new(move |_: MuxRequest| {
                        notify.notify_one();
                        async { mux_text(StatusCode::OK, "OK") }.boxed()
                    }),
                },
            );
            if replaced.is_some() {
                warn!(path = QUIT_PATH, "Built-in quit endpoint replaces user route");
            }
        }

        let mut matcher = matchit::Router::new();
        let mut problems = Vec::new();
        let mut paths: Vec<String> = routes.keys().cloned().collect();
        paths.sort_unstable();
        for (path, route) in routes {
            let inserted = matcher_template(&path).and_then(|template| {
                matcher.insert(template, route).map_err(|e| e.to_string())
            });
            if let Err(e) = inserted {
                problems.push(format!("invalid route '{}': {}", path, e));
            }
        }
        if !problems.is_empty() {
            return Err(ToolkitError::invalid_input(problems.join("; ")));
        }

        Ok(MuxApp {
            options: self.options,
            matcher,
            paths,
            quit,
        })
    }

    /// Serve on an already bound listener until `signal` resolves or `/quit` is called
    #[instrument(skip_all)]
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, signal: F) -> ToolkitResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        let app = Arc::new(self.into_app()?);
        let addr = listener.local_addr()?;
        info!(addr = %addr, "🚀 HTTP server listening");

        let quit = app.quit.clone();
        let signal = async move {
            match quit {
                Some(quit) => tokio::select! {
                    _ = signal => {}
                    _ = quit.notified() => info!("Quit requested, initiating graceful shutdown..."),
                },
                None => signal.await,
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(accept_loop(listener, app, stop_rx));

        run_until_signal(server, stop_tx, signal, SHUTDOWN_TIMEOUT).await
    }
}

#[async_trait]
impl Router for MuxRouter {
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

/// Assembled route table plus the middleware flags
pub struct MuxApp {
    options: RouterOptions,
    matcher: matchit::Router<MuxRoute>,
    paths: Vec<String>,
    quit: Option<Arc<Notify>>,
}

impl MuxApp {
    /// Registered full paths, sorted
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Run one request through the middleware chain and the route table
    pub async fn dispatch(&self, request: MuxRequest) -> MuxResponse {
        if self.options.log_request {
            log_request(
                remote_addr(request.extensions()),
                request.method(),
                request.uri(),
            );
        }

        if self.options.cors && request.method() == Method::OPTIONS {
            let mut response = mux_empty(StatusCode::OK);
            apply_cors_headers(response.headers_mut());
            return response;
        }

        let mut response = self.route(request).await;
        if self.options.cors {
            apply_cors_headers(response.headers_mut());
        }
        response
    }

    async fn route(&self, mut request: MuxRequest) -> MuxResponse {
        let (route, params) = match self.matcher.at(request.uri().path()) {
            Ok(matched) => {
                let params = matched
                    .params
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect();
                (matched.value.clone(), PathParams(params))
            }
            Err(_) => return mux_json(StatusCode::NOT_FOUND, &json!({ "error": "not found" })),
        };

        if route.method != request.method() {
            return mux_json(
                StatusCode::METHOD_NOT_ALLOWED,
                &json!({ "error": "method not allowed" }),
            );
        }

        request.extensions_mut().insert(params);
        let handler = route.handler;
        let call = async move { handler(request).await };

        if !self.options.recovery {
            return call.await;
        }

        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(response) => response,
            Err(payload) => mux_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &recovery_body(payload.as_ref()),
            ),
        }
    }

    /// Collect the body, record the peer address, then dispatch
    async fn handle(&self, request: Request<Incoming>, peer: SocketAddr) -> MuxResponse {
        let (mut parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(error = %e, "Failed to read request body");
                return mux_json(
                    StatusCode::BAD_REQUEST,
                    &json!({ "error": "failed to read request body" }),
                );
            }
        };
        parts.extensions.insert(peer);
        self.dispatch(Request::from_parts(parts, body)).await
    }
}

async fn accept_loop(
    listener: TcpListener,
    app: Arc<MuxApp>,
    mut stop: oneshot::Receiver<()>,
) -> ToolkitResult<()> {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };

                let app = Arc::clone(&app);
                let service = service_fn(move |request: Request<Incoming>| {
                    let app = Arc::clone(&app);
                    async move { Ok::<_, Infallible>(app.handle(request, peer).await) }
                });

                let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                let connection = graceful.watch(connection);
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        debug!(peer = %peer, error = %e, "Connection closed with error");
                    }
                });
            }
            _ = &mut stop => break,
        }
    }

    drop(listener);
    graceful.shutdown().await;
    Ok(())
}

/// JSON response with `Content-Type: application/json`
pub fn mux_json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> MuxResponse {
    let body = serde_json::to_vec(value).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub fn mux_text(status: StatusCode, text: &str) -> MuxResponse {
    let mut response = Response::new(Full::new(Bytes::copy_from_slice(text.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

pub fn mux_empty(status: StatusCode) -> MuxResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
