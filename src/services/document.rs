//! # Document Store Client
//!
//! ArangoDB over its REST API: connect to a server, make sure the working database
//! exists, then hand out collections (created on first use).
//!
//! Existence checks and creation failures surface as `ToolkitError::Resource`.

use crate::core::error::{ToolkitError, ToolkitResult};
use crate::services::provision::EnsureExists;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Basic-auth credentials for the server
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Connection {
    endpoint: Url,
    credentials: Option<Credentials>,
    client: reqwest::Client,
}

impl Connection {
    fn new(endpoint: &str, credentials: Option<Credentials>) -> ToolkitResult<Self> {
        if endpoint.is_empty() {
            return Err(ToolkitError::invalid_input("document store endpoint is required"));
        }
        let endpoint = Url::parse(endpoint).map_err(|e| {
            ToolkitError::invalid_input(format!("Invalid endpoint '{}': {}", endpoint, e))
        })?;
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            endpoint,
            credentials,
            client,
        })
    }

    fn request(&self, method: Method, segments: &[&str]) -> ToolkitResult<RequestBuilder> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ToolkitError::invalid_input("endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);

        let mut request = self.client.request(method, url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        Ok(request)
    }

    /// `200` → true, `404` → false, anything else is an error
    async fn check_exists(&self, segments: &[&str], what: &str) -> ToolkitResult<bool> {
        let response = self
            .request(Method::GET, segments)?
            .send()
            .await
            .map_err(|e| ToolkitError::resource(format!("Failed to check {}: {}", what, e)))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ToolkitError::resource(format!(
                    "Failed to check {}: status {} {}",
                    what,
                    status.as_u16(),
                    body
                )))
            }
        }
    }

    async fn send_json(
        &self,
        method: Method,
        segments: &[&str],
        body: &Value,
        what: &str,
    ) -> ToolkitResult<Value> {
        let response = self
            .request(method, segments)?
            .json(body)
            .send()
            .await
            .map_err(|e| ToolkitError::resource(format!("Failed to {}: {}", what, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ToolkitError::resource(format!("Failed to {}: {}", what, e)))?;

        if !status.is_success() {
            return Err(ToolkitError::resource(format!(
                "Failed to {}: status {} {}",
                what,
                status.as_u16(),
                text
            )));
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Server-level view: the databases it hosts
pub struct Server {
    conn: Connection,
}

#[async_trait]
impl EnsureExists for Server {
    type Handle = Database;

    async fn exists(&self, name: &str) -> ToolkitResult<bool> {
        self.conn
            .check_exists(&["_db", name, "_api", "database", "current"], "database")
            .await
    }

    async fn create(&self, name: &str) -> ToolkitResult<Database> {
        self.conn
            .send_json(
                Method::POST,
                &["_db", "_system", "_api", "database"],
                &json!({ "name": name }),
                "create database",
            )
            .await?;
        info!(database = name, "Database created");
        Ok(self.handle(name))
    }

    fn handle(&self, name: &str) -> Database {
        Database {
            conn: self.conn.clone(),
            name: name.to_string(),
        }
    }
}

/// One database and the collections in it
#[derive(Debug, Clone)]
pub struct Database {
    conn: Connection,
    name: String,
}

impl Database {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl EnsureExists for Database {
    type Handle = Collection;

    async fn exists(&self, name: &str) -> ToolkitResult<bool> {
        self.conn
            .check_exists(&["_db", self.name.as_str(), "_api", "collection", name], "collection")
            .await
    }

    async fn create(&self, name: &str) -> ToolkitResult<Collection> {
        self.conn
            .send_json(
                Method::POST,
                &["_db", self.name.as_str(), "_api", "collection"],
                &json!({ "name": name }),
                "create collection",
            )
            .await?;
        info!(database = %self.name, collection = name, "Collection created");
        Ok(self.handle(name))
    }

    fn handle(&self, name: &str) -> Collection {
        Collection {
            conn: self.conn.clone(),
            database: self.name.clone(),
            name: name.to_string(),
        }
    }
}

/// A collection known to exist
#[derive(Debug, Clone)]
pub struct Collection {
    conn: Connection,
    database: String,
    name: String,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Store one document, returning the server's `_id`/`_key`/`_rev` metadata
    pub async fn insert(&self, document: &Value) -> ToolkitResult<Value> {
        self.conn
            .send_json(
                Method::POST,
                &["_db", self.database.as_str(), "_api", "document", self.name.as_str()],
                document,
                "insert document",
            )
            .await
    }
}

pub struct DocumentClient {
    server: Server,
    database: Database,
}

impl DocumentClient {
    /// Connect to `endpoint` and make sure database `db_name` exists
    #[instrument(skip(credentials))]
    pub async fn connect(
        endpoint: &str,
        db_name: &str,
        credentials: Option<Credentials>,
    ) -> ToolkitResult<Self> {
        if db_name.is_empty() {
            return Err(ToolkitError::invalid_input("database name is required"));
        }
        let server = Server {
            conn: Connection::new(endpoint, credentials)?,
        };
        let database = server.ensure(db_name).await?;
        debug!(database = db_name, "Document store connected");

        Ok(Self { server, database })
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Collection `name`, created when missing
    pub async fn collection(&self, name: &str) -> ToolkitResult<Collection> {
        if name.is_empty() {
            return Err(ToolkitError::invalid_input("collection name is required"));
        }
        self.database.ensure(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_building() {
        let conn = Connection::new("http://localhost:8529/", None).unwrap();
        let request = conn
            .request(Method::GET, &["_db", "shop", "_api", "collection", "orders"])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8529/_db/shop/_api/collection/orders"
        );
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_names() {
        assert!(matches!(
            DocumentClient::connect("", "shop", None).await,
            Err(ToolkitError::InvalidInput { .. })
        ));
        assert!(matches!(
            DocumentClient::connect("http://localhost:8529", "", None).await,
            Err(ToolkitError::InvalidInput { .. })
        ));
    }
}
