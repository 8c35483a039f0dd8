//! Outbound JSON HTTP requests: a one-shot [`request`] function and the fluent [`HttpClient`].

pub mod request;

pub use request::{request, HttpClient, JsonBody, DEFAULT_TIMEOUT, JSON_CONTENT_TYPE};
