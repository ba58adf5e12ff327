//! Controller-specific error types.
//!
//! Phase reconcilers report through [`crate::phase::PhaseError`] and cluster
//! calls through [`crate::cluster::ClusterError`]; this covers startup, the
//! watchers and the update checker.

use appregistry_client::AppRegistryError;
use datastore::DatastoreError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the Marketplace Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Registry request failed
    #[error("Registry error: {0}")]
    Registry(#[from] AppRegistryError),

    /// Manifest datastore error
    #[error("Datastore error: {0}")]
    Datastore(#[from] DatastoreError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
