//! # Service Toolkit - Main Entry Point
//!
//! Runs a minimal service on the toolkit: configuration from `.env` and the environment,
//! a structured logger, and an axum router under `/<VERSION>` with health check, CORS,
//! request logging and panic recovery. Stops gracefully on SIGINT/SIGTERM.
//!
//! Exit status is `0` after a graceful stop and non-zero when configuration fails,
//! the port cannot be bound, or shutdown misses its deadline.

use axum::http::Method;
use axum::Json;
use serde_json::{json, Value};
use service_toolkit::observability::init_tracing;
use service_toolkit::routing::{AxumRouter, Router};
use service_toolkit::{Config, Logger};
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(e) = init_tracing("service_toolkit=info,tower_http=info") {
        eprintln!("failed to initialize tracing: {}", e);
    }

    info!("🚀 Starting service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => Logger::new().fatal(
            "failed to load configuration",
            &[json!("error"), json!(e.to_string())],
        ),
    };

    let logger = build_logger(&config);
    logger.info(
        "configuration loaded",
        &[
            json!("env"),
            json!(config.env),
            json!("port"),
            json!(config.port),
            json!("version"),
            json!(config.version),
        ],
    );

    let about = json!({ "env": config.env, "version": config.version });
    let result = AxumRouter::new(config.port.clone())
        .add_path("/version", Method::GET, move || async move {
            Json::<Value>(about)
        })
        .add_prefix(config.version.clone())
        .allow_cors()
        .allow_log()
        .allow_recovery()
        .allow_health_check()
        .serve_http()
        .await;

    match result {
        Ok(()) => logger.info("✅ service shutdown complete", &[]),
        Err(e) => logger.fatal(
            "server stopped with error",
            &[json!("error"), json!(e.to_string())],
        ),
    }
}

/// Logger at the configured level, plus a webhook alert when `ALERT_WEBHOOK_URL` is set
fn build_logger(config: &Config) -> Logger {
    let mut logger = Logger::new().set_caller();

    match config.level() {
        Ok(level) => logger = logger.set_level(level),
        Err(e) => logger.warn(
            "invalid log level, keeping default",
            &[json!("error"), json!(e.to_string())],
        ),
    }

    if let Ok(url) = std::env::var("ALERT_WEBHOOK_URL") {
        logger = logger.set_webhook(&url);
    }
    logger
}
