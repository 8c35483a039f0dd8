//! Panic recovery for request handlers.
//!
//! A panicking handler is turned into `500 {"error": "recovering from err <panic>"}` and
//! the server keeps serving. The body deliberately stops at the panic message: no
//! ` with <stack>` suffix, so stack traces never reach clients. The backtrace goes to the
//! error log instead. It is captured while recovering, so it shows the recovery path
//! rather than the panic site; run with `RUST_BACKTRACE=1` to get the panic-site trace
//! from the default hook.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::any::Any;
use std::backtrace::Backtrace;
use tracing::error;

pub const RECOVERY_PREFIX: &str = "recovering from err";

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Log the panic with a backtrace and build the error body
pub fn recovery_body(payload: &(dyn Any + Send)) -> Value {
    let message = panic_message(payload);
    let backtrace = Backtrace::force_capture();
    error!(panic = %message, backtrace = %backtrace, "Recovered from panic in handler");
    json!({ "error": format!("{} {}", RECOVERY_PREFIX, message) })
}

/// Response factory for `tower_http::catch_panic::CatchPanicLayer::custom`
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(recovery_body(payload.as_ref())),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let borrowed: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("index out of range"));
        let other: Box<dyn Any + Send> = Box::new(42u8);

        assert_eq!(panic_message(borrowed.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "index out of range");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_recovery_body_shape() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(
            recovery_body(payload.as_ref()),
            json!({ "error": "recovering from err boom" })
        );
    }

    #[test]
    fn test_recovery_body_omits_backtrace() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("index out of range"));
        let body = recovery_body(payload.as_ref());
        let message = body["error"].as_str().unwrap();

        assert_eq!(message, "recovering from err index out of range");
        assert!(!message.contains(" with "));
        assert!(!message.contains("backtrace"));
    }

    #[test]
    fn test_panic_response_status() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
