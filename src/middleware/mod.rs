//! HTTP middleware shared by the router backends: request logging, CORS and panic recovery.

pub mod cors;
pub mod recovery;
pub mod request_logging;

pub use cors::{apply_cors_headers, cors_middleware};
pub use recovery::{panic_message, panic_response, recovery_body};
pub use request_logging::{log_request, remote_addr, trace_layer, RequestTraceLayer};
