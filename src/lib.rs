//! # Service Toolkit - Core Library Crate
//!
//! Building blocks for small HTTP microservices: a JSON request client, a router builder
//! with two interchangeable backends, a structured logger, environment configuration,
//! an HTTP error catalogue, and thin clients for search, document and object stores.
//!
//! ## Module Map
//!
//! - `core`: error types, the HTTP error catalogue and configuration loading
//! - `client`: single-attempt JSON HTTP requests
//! - `routing`: the `Router` trait with `AxumRouter` and `MuxRouter` backends
//! - `middleware`: request logging, CORS and panic recovery shared by the backends
//! - `observability`: the structured `Logger` and `tracing` subscriber setup
//! - `services`: search (Elasticsearch), document (ArangoDB) and object storage (S3/MinIO) clients
//! - `utils`: time and randomness helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::http::Method;
//! use service_toolkit::routing::{AxumRouter, Router};
//!
//! # async fn run() -> service_toolkit::ToolkitResult<()> {
//! AxumRouter::new("8080")
//!     .add_path("/hello", Method::GET, || async { "hello" })
//!     .add_prefix("v1")
//!     .allow_health_check()
//!     .allow_recovery()
//!     .serve_http()
//!     .await
//! # }
//! ```

/// Error types, the HTTP error catalogue and configuration
pub mod core;

/// JSON HTTP request executor
pub mod client;

/// Router builder and its backends
pub mod routing;

/// Middleware shared by the router backends
pub mod middleware;

/// Structured logging and tracing setup
pub mod observability;

/// Backing service clients
pub mod services;

/// Small helpers: time formats, random numbers, UUIDs
pub mod utils;

// Users can write `use service_toolkit::ToolkitError` instead of the full module path
pub use core::config::Config;
pub use core::errs::ApiError;
pub use core::error::{ToolkitError, ToolkitResult};
pub use observability::{Level, Logger};
pub use routing::{AxumRouter, MuxRouter, Router};
