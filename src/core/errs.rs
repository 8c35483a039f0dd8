//! # Handler Error Catalogue
//!
//! A fixed set of user-facing errors for HTTP handlers. Handlers return `ApiError`
//! (or `Result<T, ApiError>`) and axum renders it as `{"error": "<message>"}` with the
//! status code from [`ApiError::status_code`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Catalogue of handler-level errors with fixed client messages
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    #[error("you are not allowed to access this resource")]
    Forbidden,

    #[error("invalid request")]
    InvalidRequest,

    #[error("incorrect data request")]
    IncorrectData,

    #[error("resource not found")]
    ResourceNotFound,

    #[error("something wrong happened")]
    SomethingWrong,

    #[error("server failure")]
    ServerFailure,

    #[error("unauthorized request")]
    Unauthorized,

    #[error("redis connection error")]
    RedisConnection,

    #[error("transaction error")]
    Transaction,

    #[error("create resource error")]
    CreateResource,

    #[error("update resource error")]
    UpdateResource,

    #[error("access resource error")]
    AccessResource,

    #[error("delete resource error")]
    DeleteResource,
}

impl ApiError {
    /// Map the error to an HTTP status code.
    ///
    /// Only forbidden and the three bad-request errors have dedicated codes; everything
    /// else, `Unauthorized` included, is reported as 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidRequest | Self::IncorrectData | Self::ResourceNotFound => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
