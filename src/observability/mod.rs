//! # Observability
//!
//! Two separate concerns live here:
//!
//! - [`Logger`]: the application-facing structured logger with runtime-chosen fields,
//!   daily file rotation and alert hooks.
//! - [`init_tracing`]: the `tracing` subscriber used by the toolkit's own diagnostics
//!   (router startup, request logging, client failures).

pub mod fields;
pub mod hook;
pub mod logger;
pub mod writer;

pub use fields::{fields, DATA_KEY, EXTRA_KEY};
pub use hook::{AlertHook, WebhookHook};
pub use logger::{Level, LogRecord, Logger};
pub use writer::DailyFileWriter;

use crate::core::error::{ToolkitError, ToolkitResult};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global `tracing` subscriber: JSON lines, filtered by `RUST_LOG` or
/// `default_directives` when it is unset.
///
/// Calling this twice is harmless; the second call logs a warning and keeps the first subscriber.
pub fn init_tracing(default_directives: &str) -> ToolkitResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives))
        .map_err(|e| {
            ToolkitError::invalid_input(format!("Invalid tracing filter '{}': {}", default_directives, e))
        })?;

    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json(),
        )
        .with(filter)
        .try_init();

    if result.is_err() {
        warn!("Tracing subscriber already initialized, skipping initialization");
    }

    Ok(())
}
