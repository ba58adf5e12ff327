use super::PhaseError;
use super::builder::catalog_source_config_name;
use crate::cluster::{ClusterClient, ClusterError};
use crds::OperatorSource;
use datastore::{ManifestStore, Writer};
use kube::ResourceExt;
use std::sync::Arc;
use tracing::debug;

/// Removes everything created on behalf of an `OperatorSource`: its store row,
/// its CatalogSourceConfig and its ConfigMap. Missing pieces are skipped.
#[derive(Clone)]
pub struct Purger {
    store: Arc<ManifestStore>,
    cluster: Arc<dyn ClusterClient>,
}

fn ignore_not_found(result: Result<(), ClusterError>) -> Result<(), ClusterError> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

impl Purger {
    pub fn new(store: Arc<ManifestStore>, cluster: Arc<dyn ClusterClient>) -> Self {
        Self { store, cluster }
    }

    /// Purge all artifacts of `opsrc`.
    ///
    /// # Errors
    ///
    /// Cluster errors other than not-found.
    pub async fn purge(&self, opsrc: &OperatorSource) -> Result<(), PhaseError> {
        if let Some(uid) = opsrc.uid() {
            self.store.remove(&uid);
        }

        let namespace = opsrc.namespace().unwrap_or_default();
        let name = catalog_source_config_name(opsrc);
        ignore_not_found(self.cluster.delete_catalog_source_config(&namespace, &name).await)?;
        ignore_not_found(self.cluster.delete_config_map(&namespace, &name).await)?;

        debug!("Purged artifacts of {}", opsrc.namespaced_name());
        Ok(())
    }
}
