//! Idempotent "create if missing" provisioning.

use crate::core::error::ToolkitResult;
use async_trait::async_trait;
use tracing::info;

/// A namespace of named resources (databases on a server, collections in a database)
/// that can be checked for and created.
#[async_trait]
pub trait EnsureExists: Send + Sync {
    /// Handle returned for a resource once it is known to exist
    type Handle: Send;

    async fn exists(&self, name: &str) -> ToolkitResult<bool>;

    async fn create(&self, name: &str) -> ToolkitResult<Self::Handle>;

    /// Handle to a resource already known to exist
    fn handle(&self, name: &str) -> Self::Handle;

    /// Reuse `name` if it exists, create it otherwise
    async fn ensure(&self, name: &str) -> ToolkitResult<Self::Handle> {
        if self.exists(name).await? {
            Ok(self.handle(name))
        } else {
            info!(name, "Resource missing, creating it");
            self.create(name).await
        }
    }
}
