//! Clients for the backing services a microservice typically talks to.

pub mod document;
pub mod object;
pub mod provision;
pub mod search;

pub use document::{Collection, Credentials, Database, DocumentClient, Server};
pub use object::{ObjectBucket, ObjectClient, ObjectConfig};
pub use provision::EnsureExists;
pub use search::{MultiMatchQuery, SearchClient, SearchConfig, SearchHits};
