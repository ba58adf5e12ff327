//! Registry client traits for mocking
//!
//! The controller only sees these traits. The concrete app-registry client
//! implements them and tests plug in the in-memory mock.

use crate::error::AppRegistryError;
use crate::models::{OperatorMetadata, PackageMetadata};

/// Operations the controller needs from a remote registry.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait RegistryClientTrait: Send + Sync {
    /// List every repository (with its current release digest) in `namespace`.
    async fn list_packages(&self, namespace: &str) -> Result<Vec<PackageMetadata>, AppRegistryError>;

    /// Download the manifest blob of every repository in `namespace`.
    async fn retrieve_all(&self, namespace: &str) -> Result<Vec<OperatorMetadata>, AppRegistryError>;
}

/// Builds registry clients from an operator source's type and endpoint.
pub trait ClientFactory: Send + Sync {
    /// Create a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Unsupported registry type or an endpoint that isn't a URL.
    fn new_client(
        &self,
        registry_type: &str,
        endpoint: &str,
    ) -> Result<Box<dyn RegistryClientTrait>, AppRegistryError>;
}
