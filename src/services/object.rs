//! # Object Storage Client
//!
//! S3-compatible storage (MinIO, AWS S3) through `rust-s3`, always with path-style URLs
//! (`<endpoint>/<bucket>/<key>`). Buckets are provisioned through [`EnsureExists`]; the
//! default bucket, when configured, is created on connect.
//!
//! Every storage failure surfaces as `ToolkitError::Resource`.

use crate::core::error::{ToolkitError, ToolkitResult};
use crate::services::provision::EnsureExists;
use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, BucketConfiguration, Region};
use std::fmt;
use tracing::{debug, info, instrument};

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct ObjectConfig {
    /// `host:port` of the storage server
    pub addr: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_ssl: bool,
    /// Bucket used by the `*_file` operations; empty means none
    pub default_bucket: String,
    /// Empty means [`DEFAULT_REGION`]
    pub region: String,
}

impl fmt::Debug for ObjectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectConfig")
            .field("addr", &self.addr)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("use_ssl", &self.use_ssl)
            .field("default_bucket", &self.default_bucket)
            .field("region", &self.region)
            .finish()
    }
}

impl ObjectConfig {
    fn endpoint(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.addr)
    }

    fn region(&self) -> Region {
        let region = if self.region.is_empty() {
            DEFAULT_REGION
        } else {
            self.region.as_str()
        };
        Region::Custom {
            region: region.to_string(),
            endpoint: self.endpoint(),
        }
    }
}

fn storage_error(what: &str, e: S3Error) -> ToolkitError {
    ToolkitError::resource(format!("Failed to {}: {}", what, e))
}

/// Object keys always start with `/`
fn object_key(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// One bucket, known to exist
#[derive(Clone)]
pub struct ObjectBucket {
    name: String,
    region: Region,
    credentials: Credentials,
}

impl fmt::Debug for ObjectBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBucket")
            .field("name", &self.name)
            .field("region", &self.region)
            .finish()
    }
}

impl ObjectBucket {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn inner(&self) -> ToolkitResult<Box<Bucket>> {
        let bucket: Box<Bucket> =
            Bucket::new(&self.name, self.region.clone(), self.credentials.clone())
                .map_err(|e| storage_error("open bucket", e))?
                .with_path_style()
                .into();
        Ok(bucket)
    }

    /// Object content under `path`
    pub async fn get(&self, path: &str) -> ToolkitResult<Vec<u8>> {
        let response = self
            .inner()?
            .get_object(object_key(path))
            .await
            .map_err(|e| storage_error("get object", e))?;
        Ok(response.bytes().to_vec())
    }

    pub async fn put(&self, path: &str, data: &[u8]) -> ToolkitResult<()> {
        let key = object_key(path);
        self.inner()?
            .put_object(&key, data)
            .await
            .map_err(|e| storage_error("put object", e))?;
        info!(bucket = %self.name, key = %key, size = data.len(), "Put file success");
        Ok(())
    }

    pub async fn remove(&self, path: &str) -> ToolkitResult<()> {
        self.inner()?
            .delete_object(object_key(path))
            .await
            .map_err(|e| storage_error("remove object", e))?;
        Ok(())
    }
}

pub struct ObjectClient {
    region: Region,
    credentials: Credentials,
    default_bucket: Option<ObjectBucket>,
}

impl ObjectClient {
    /// Build the client and make sure the default bucket exists, when one is configured
    #[instrument(skip_all, fields(addr = %config.addr))]
    pub async fn connect(config: ObjectConfig) -> ToolkitResult<Self> {
        if config.addr.is_empty() {
            return Err(ToolkitError::invalid_input("object storage address is required"));
        }
        let credentials = Credentials::new(
            Some(config.access_key.as_str()),
            Some(config.secret_key.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| ToolkitError::invalid_input(format!("Invalid credentials: {}", e)))?;

        let mut client = Self {
            region: config.region(),
            credentials,
            default_bucket: None,
        };
        if !config.default_bucket.is_empty() {
            client.default_bucket = Some(client.ensure(&config.default_bucket).await?);
        }
        debug!("Object storage connected");

        Ok(client)
    }

    pub fn default_bucket(&self) -> Option<&ObjectBucket> {
        self.default_bucket.as_ref()
    }

    pub async fn get(&self, bucket: &str, path: &str) -> ToolkitResult<Vec<u8>> {
        self.handle(bucket).get(path).await
    }

    pub async fn put(&self, bucket: &str, path: &str, data: &[u8]) -> ToolkitResult<()> {
        self.handle(bucket).put(path, data).await
    }

    pub async fn remove(&self, bucket: &str, path: &str) -> ToolkitResult<()> {
        self.handle(bucket).remove(path).await
    }

    /// Like [`ObjectClient::get`] on the default bucket
    pub async fn get_file(&self, path: &str) -> ToolkitResult<Vec<u8>> {
        self.require_default()?.get(path).await
    }

    pub async fn put_file(&self, path: &str, data: &[u8]) -> ToolkitResult<()> {
        self.require_default()?.put(path, data).await
    }

    pub async fn remove_file(&self, path: &str) -> ToolkitResult<()> {
        self.require_default()?.remove(path).await
    }

    fn require_default(&self) -> ToolkitResult<&ObjectBucket> {
        self.default_bucket
            .as_ref()
            .ok_or_else(|| ToolkitError::invalid_input("no default bucket configured"))
    }
}

#[async_trait]
impl EnsureExists for ObjectClient {
    type Handle = ObjectBucket;

    async fn exists(&self, name: &str) -> ToolkitResult<bool> {
        self.handle(name)
            .inner()?
            .exists()
            .await
            .map_err(|e| storage_error("check bucket", e))
    }

    async fn create(&self, name: &str) -> ToolkitResult<ObjectBucket> {
        let response = Bucket::create_with_path_style(
            name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| storage_error("create bucket", e))?;

        if !(200..300).contains(&response.response_code) {
            return Err(ToolkitError::resource(format!(
                "Failed to create bucket: status {} {}",
                response.response_code, response.response_text
            )));
        }
        info!(bucket = name, "Create bucket success");
        Ok(self.handle(name))
    }

    fn handle(&self, name: &str) -> ObjectBucket {
        ObjectBucket {
            name: name.to_string(),
            region: self.region.clone(),
            credentials: self.credentials.clone(),
        }
    }
}
