//! Cluster resource access.
//!
//! Reconcilers talk to the API server through [`ClusterClient`] so they can be
//! unit tested against the in-memory mock in `test_utils`.

use async_trait::async_trait;
use crds::{CatalogSourceConfig, OperatorSource};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use thiserror::Error;
use tracing::debug;

/// Errors returned by [`ClusterClient`] operations.
///
/// `NotFound` and `AlreadyExists` are kept apart so callers can treat them as
/// success where the operation is expected to be idempotent. `Conflict` means
/// the write was based on a stale copy and can be retried after a fresh read.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// Object already exists
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// Object changed since it was read
    #[error("{kind} {namespace}/{name} was modified concurrently")]
    Conflict {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// Object can't be sent to the API server as is
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    /// Any other API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),
}

impl ClusterError {
    /// `true` for [`ClusterError::NotFound`]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }

    /// `true` for [`ClusterError::AlreadyExists`]
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists { .. })
    }

    /// `true` for [`ClusterError::Conflict`]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClusterError::Conflict { .. })
    }

    /// Map an API error on `namespace/name`, keeping 409 apart.
    fn from_write(kind: &'static str, namespace: &str, name: &str, error: kube::Error) -> Self {
        match error {
            kube::Error::Api(ref response) if response.code == 409 => ClusterError::Conflict {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            other => ClusterError::Kube(other),
        }
    }
}

/// Cluster operations needed by the marketplace reconcilers.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch the live `OperatorSource`.
    async fn get_operator_source(&self, namespace: &str, name: &str) -> Result<OperatorSource, ClusterError>;

    /// Persist the status of `opsrc`.
    ///
    /// When `opsrc` carries a resource version the write only succeeds if the
    /// stored object still has it, otherwise [`ClusterError::Conflict`].
    async fn update_operator_source_status(&self, opsrc: &OperatorSource) -> Result<(), ClusterError>;

    /// Fetch a `CatalogSourceConfig`.
    async fn get_catalog_source_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<CatalogSourceConfig, ClusterError>;

    /// Create a `CatalogSourceConfig`.
    async fn create_catalog_source_config(&self, csc: &CatalogSourceConfig) -> Result<(), ClusterError>;

    /// Delete a `CatalogSourceConfig`.
    async fn delete_catalog_source_config(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    /// Create a `ConfigMap`.
    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<(), ClusterError>;

    /// Replace the data of an existing `ConfigMap`.
    async fn update_config_map_data(&self, config_map: &ConfigMap) -> Result<(), ClusterError>;

    /// Delete a `ConfigMap`.
    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;
}

/// [`ClusterClient`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn get<K>(&self, kind: &'static str, namespace: &str, name: &str) -> Result<K, ClusterError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        self.api::<K>(namespace)
            .get_opt(name)
            .await?
            .ok_or_else(|| ClusterError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn create<K>(&self, kind: &'static str, object: &K) -> Result<(), ClusterError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Serialize
            + Debug,
        K::DynamicType: Default,
    {
        let namespace = object
            .namespace()
            .ok_or_else(|| ClusterError::InvalidObject(format!("{kind} without namespace")))?;
        let name = object.name_any();
        let api = self.api::<K>(&namespace);

        if api.get_opt(&name).await?.is_some() {
            return Err(ClusterError::AlreadyExists { kind, namespace, name });
        }

        debug!("Creating {} {}/{}", kind, namespace, name);
        api.create(&PostParams::default(), object).await?;
        Ok(())
    }

    async fn delete<K>(&self, kind: &'static str, namespace: &str, name: &str) -> Result<(), ClusterError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let api = self.api::<K>(namespace);
        if api.get_opt(name).await?.is_none() {
            return Err(ClusterError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }

        debug!("Deleting {} {}/{}", kind, namespace, name);
        api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_operator_source(&self, namespace: &str, name: &str) -> Result<OperatorSource, ClusterError> {
        self.get("OperatorSource", namespace, name).await
    }

    async fn update_operator_source_status(&self, opsrc: &OperatorSource) -> Result<(), ClusterError> {
        let namespace = opsrc
            .namespace()
            .ok_or_else(|| ClusterError::InvalidObject("OperatorSource without namespace".to_string()))?;
        let name = opsrc.name_any();
        let api: Api<OperatorSource> = self.api(&namespace);

        let mut patch = serde_json::json!({ "status": opsrc.status });
        if let Some(resource_version) = opsrc.resource_version() {
            patch["metadata"] = serde_json::json!({ "resourceVersion": resource_version });
        }
        api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| ClusterError::from_write("OperatorSource", &namespace, &name, e))?;
        Ok(())
    }

    async fn get_catalog_source_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<CatalogSourceConfig, ClusterError> {
        self.get("CatalogSourceConfig", namespace, name).await
    }

    async fn create_catalog_source_config(&self, csc: &CatalogSourceConfig) -> Result<(), ClusterError> {
        self.create("CatalogSourceConfig", csc).await
    }

    async fn delete_catalog_source_config(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.delete::<CatalogSourceConfig>("CatalogSourceConfig", namespace, name)
            .await
    }

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<(), ClusterError> {
        self.create("ConfigMap", config_map).await
    }

    async fn update_config_map_data(&self, config_map: &ConfigMap) -> Result<(), ClusterError> {
        let namespace = config_map
            .namespace()
            .ok_or_else(|| ClusterError::InvalidObject("ConfigMap without namespace".to_string()))?;
        let name = config_map.name_any();
        let api: Api<ConfigMap> = self.api(&namespace);

        debug!("Updating ConfigMap {}/{}", namespace, name);
        let patch = serde_json::json!({ "data": config_map.data });
        api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| ClusterError::from_write("ConfigMap", &namespace, &name, e))?;
        Ok(())
    }

    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.delete::<ConfigMap>("ConfigMap", namespace, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "the object has been modified".to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_409_maps_to_conflict() {
        let error = ClusterError::from_write("OperatorSource", "marketplace", "community", api_error(409, "Conflict"));

        assert!(error.is_conflict());
        assert_eq!(
            error.to_string(),
            "OperatorSource marketplace/community was modified concurrently"
        );
    }

    #[test]
    fn test_other_api_errors_stay_kube_errors() {
        let error = ClusterError::from_write("OperatorSource", "marketplace", "community", api_error(422, "Invalid"));

        assert!(!error.is_conflict());
        assert!(matches!(error, ClusterError::Kube(_)));
    }
}
