//! Mock registry client for unit testing
//!
//! Holds per-namespace listings and blobs in memory so controller tests can
//! run without a registry.

use crate::error::AppRegistryError;
use crate::models::{OperatorMetadata, PackageMetadata, RegistryMetadata};
use crate::registry_trait::{ClientFactory, RegistryClientTrait};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory registry.
///
/// Clones share state, so a test can keep a handle while the code under test
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MockRegistryClient {
    namespaces: Arc<Mutex<HashMap<String, Vec<OperatorMetadata>>>>,
    fail_with: Arc<Mutex<Option<String>>>,
    list_calls: Arc<Mutex<usize>>,
}

impl MockRegistryClient {
    /// Create an empty mock registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a repository blob under `namespace` (replaces an existing
    /// repository with the same name)
    pub fn add_blob(&self, namespace: &str, repository: &str, release: &str, digest: &str, raw_yaml: &str) {
        let mut namespaces = self.namespaces.lock().unwrap();
        let blobs = namespaces.entry(namespace.to_string()).or_default();
        blobs.retain(|b| b.metadata.repository != repository);
        blobs.push(OperatorMetadata {
            metadata: RegistryMetadata {
                namespace: namespace.to_string(),
                repository: repository.to_string(),
                release: release.to_string(),
                digest: digest.to_string(),
            },
            raw_yaml: raw_yaml.as_bytes().to_vec(),
        });
    }

    /// Make `namespace` exist with no repositories
    pub fn add_empty_namespace(&self, namespace: &str) {
        self.namespaces
            .lock()
            .unwrap()
            .entry(namespace.to_string())
            .or_default();
    }

    /// Make every subsequent call fail with an API error (None to recover)
    pub fn set_failure(&self, message: Option<&str>) {
        *self.fail_with.lock().unwrap() = message.map(ToString::to_string);
    }

    /// Number of `list_packages` calls served so far
    #[must_use]
    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    fn check_failure(&self) -> Result<(), AppRegistryError> {
        match self.fail_with.lock().unwrap().as_ref() {
            Some(message) => Err(AppRegistryError::Api(message.clone())),
            None => Ok(()),
        }
    }

    fn blobs(&self, namespace: &str) -> Result<Vec<OperatorMetadata>, AppRegistryError> {
        self.namespaces
            .lock()
            .unwrap()
            .get(namespace)
            .cloned()
            .ok_or_else(|| AppRegistryError::NotFound(format!("namespace {namespace}")))
    }
}

#[async_trait::async_trait]
impl RegistryClientTrait for MockRegistryClient {
    async fn list_packages(&self, namespace: &str) -> Result<Vec<PackageMetadata>, AppRegistryError> {
        *self.list_calls.lock().unwrap() += 1;
        self.check_failure()?;
        Ok(self.blobs(namespace)?.into_iter().map(|b| b.metadata).collect())
    }

    async fn retrieve_all(&self, namespace: &str) -> Result<Vec<OperatorMetadata>, AppRegistryError> {
        self.check_failure()?;
        self.blobs(namespace)
    }
}

/// Factory handing out clones of one [`MockRegistryClient`].
#[derive(Debug, Clone, Default)]
pub struct MockClientFactory {
    client: MockRegistryClient,
}

impl MockClientFactory {
    /// Factory serving `client`
    #[must_use]
    pub fn new(client: MockRegistryClient) -> Self {
        Self { client }
    }
}

impl ClientFactory for MockClientFactory {
    fn new_client(
        &self,
        registry_type: &str,
        _endpoint: &str,
    ) -> Result<Box<dyn RegistryClientTrait>, AppRegistryError> {
        if !registry_type.eq_ignore_ascii_case(crate::client::APP_REGISTRY_TYPE) {
            return Err(AppRegistryError::UnsupportedType(registry_type.to_string()));
        }
        Ok(Box::new(self.client.clone()))
    }
}
