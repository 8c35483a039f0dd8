//! HTTP routing: the [`Router`] trait and its two backends.
//!
//! - [`AxumRouter`]: built on `axum` and `tower-http` layers
//! - [`MuxRouter`]: a hand-rolled route table served directly on `hyper`

pub mod axum_router;
pub mod mux_router;
pub mod router;
pub mod shutdown;

pub use axum_router::AxumRouter;
pub use mux_router::{
    mux_empty, mux_json, mux_text, MuxApp, MuxHandler, MuxRequest, MuxResponse, MuxRouter,
    PathParams, QUIT_PATH,
};
pub use router::{
    health_body, normalize_prefix, validate_paths, validate_prefix, Router, RouterOptions,
    HEALTH_MESSAGE, HEALTH_PATH, SHUTDOWN_TIMEOUT,
};
pub use shutdown::shutdown_signal;
