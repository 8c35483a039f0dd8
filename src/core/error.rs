//! # Error Handling Module
//!
//! This module defines the error taxonomy shared by every utility in the toolkit using the
//! `thiserror` crate. Each variant maps to one failure category that callers can match on,
//! and each carries enough context (messages, status codes, response bodies) to be logged
//! or rendered without further lookups.
//!
//! ## Rust Concepts Used
//!
//! - `Result<T, E>` instead of exceptions: every fallible operation returns `ToolkitResult<T>`
//! - The `?` operator converts library errors into `ToolkitError` through the `From` impls below
//! - `IntoResponse` lets handlers return `ToolkitError` directly from axum routes
//!
//! ## Retry Policy
//! No variant is retried automatically. Callers receive the typed failure and decide.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Result type used throughout the toolkit
pub type ToolkitResult<T> = Result<T, ToolkitError>;

/// Error taxonomy for the toolkit
///
/// The `#[error("...")]` attribute from `thiserror` implements `Display` with the given message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolkitError {
    /// Caller supplied something unusable (empty URL, malformed config value, bad header)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// JSON serialization or deserialization failed
    #[error("Encoding error: {message}")]
    Encoding { message: String },

    /// Connection-level failure, including transport timeouts
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Remote answered with a status outside [200, 299]
    #[error("request failed with status code {status}, resp {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A downstream collaborator failed to check or create a resource
    #[error("Resource error: {message}")]
    Resource { message: String },

    /// The HTTP listener could not bind or stopped unexpectedly
    #[error("Server error: {message}")]
    Server { message: String },

    /// Graceful shutdown did not complete in time
    #[error("Server shutdown failed: {message}")]
    Shutdown { message: String },

    /// Filesystem errors (log directory, log files)
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl ToolkitError {
    /// Create an invalid input error with a custom message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an encoding error with a custom message
    pub fn encoding<S: Into<String>>(message: S) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a transport error with a custom message
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an unexpected status error from a status code and raw body text
    pub fn unexpected_status<S: Into<String>>(status: u16, body: S) -> Self {
        Self::UnexpectedStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a resource error with a custom message
    pub fn resource<S: Into<String>>(message: S) -> Self {
        Self::Resource {
            message: message.into(),
        }
    }

    /// Create a server error with a custom message
    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// Create a shutdown error with a custom message
    pub fn shutdown<S: Into<String>>(message: S) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }

    /// Get the HTTP status code used when this error is rendered as a response
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Encoding { .. } => StatusCode::BAD_REQUEST,
            Self::Transport { .. } => StatusCode::BAD_GATEWAY,
            Self::UnexpectedStatus { .. } => StatusCode::BAD_GATEWAY,
            Self::Resource { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shutdown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a string representation of the error type for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::Encoding { .. } => "encoding_error",
            Self::Transport { .. } => "transport_error",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::Resource { .. } => "resource_error",
            Self::Server { .. } => "server_error",
            Self::Shutdown { .. } => "shutdown_error",
            Self::Io { .. } => "io_error",
        }
    }
}

impl From<std::io::Error> for ToolkitError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ToolkitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding {
            message: err.to_string(),
        }
    }
}

/// Builder and connection failures are transport failures; status handling is done by callers
impl From<reqwest::Error> for ToolkitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Encoding {
                message: err.to_string(),
            };
        }
        Self::Transport {
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ToolkitError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.to_string(),
            "type": self.error_type(),
        });

        (status, Json(body)).into_response()
    }
}
