//! Per-request log lines.
//!
//! Each request produces one `info` event with the remote address, method and URI. On the
//! axum backend this runs inside a `TraceLayer`, so handler events inherit the request span.

use axum::extract::ConnectInfo;
use axum::http::{Extensions, Method, Request, Uri};
use std::net::SocketAddr;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{MakeSpan, OnRequest, TraceLayer};
use tracing::{info, info_span, Span};

/// Remote peer recorded by either backend, if any
pub fn remote_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
        .or_else(|| extensions.get::<SocketAddr>().copied())
}

pub fn log_request(remote: Option<SocketAddr>, method: &Method, uri: &Uri) {
    match remote {
        Some(addr) => info!(remote_addr = %addr, method = %method, uri = %uri, "Request received"),
        None => info!(method = %method, uri = %uri, "Request received"),
    }
}

/// Span opened around every request
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnRequest;

impl<B> OnRequest<B> for LogOnRequest {
    fn on_request(&mut self, request: &Request<B>, _span: &Span) {
        log_request(
            remote_addr(request.extensions()),
            request.method(),
            request.uri(),
        );
    }
}

pub type RequestTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan, LogOnRequest>;

pub fn trace_layer() -> RequestTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_request(LogOnRequest)
}
