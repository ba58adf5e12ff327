use super::builder::{catalog_source_config, catalog_source_config_name, config_map};
use super::{PhaseError, PhaseOutcome, PhaseReconciler};
use crate::cluster::ClusterClient;
use async_trait::async_trait;
use crds::{CatalogSourceConfig, OperatorSource, PhaseName};
use datastore::{ManifestStore, Reader, Writer};
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info};

/// Publishes the downloaded packages as a ConfigMap plus a
/// CatalogSourceConfig naming them.
pub(crate) struct ConfiguringReconciler {
    store: Arc<ManifestStore>,
    cluster: Arc<dyn ClusterClient>,
}

impl ConfiguringReconciler {
    pub(crate) fn new(store: Arc<ManifestStore>, cluster: Arc<dyn ClusterClient>) -> Self {
        Self { store, cluster }
    }

    async fn existing(&self, opsrc: &OperatorSource) -> Result<Option<CatalogSourceConfig>, PhaseError> {
        let namespace = opsrc.namespace().unwrap_or_default();
        match self
            .cluster
            .get_catalog_source_config(&namespace, &catalog_source_config_name(opsrc))
            .await
        {
            Ok(csc) => Ok(Some(csc)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn configure(&self, opsrc: &OperatorSource) -> Result<(), PhaseError> {
        if self.existing(opsrc).await?.is_some() {
            debug!("CatalogSourceConfig for {} already exists", opsrc.namespaced_name());
            return Ok(());
        }

        let uid = opsrc.uid().unwrap_or_default();
        let package_ids = self.store.get_package_ids(&uid);
        let ids: Vec<String> = package_ids
            .split(',')
            .filter(|id| !id.is_empty())
            .map(ToString::to_string)
            .collect();
        let data = self.store.read(&ids)?;

        // a ConfigMap left behind by an interrupted purge holds the previous
        // download and must not be published as is
        let config_map = config_map(opsrc, data);
        match self.cluster.create_config_map(&config_map).await {
            Err(e) if e.is_already_exists() => {
                debug!("Refreshing existing ConfigMap for {}", opsrc.namespaced_name());
                self.cluster.update_config_map_data(&config_map).await?;
            }
            Err(e) => return Err(e.into()),
            Ok(()) => {}
        }

        match self
            .cluster
            .create_catalog_source_config(&catalog_source_config(opsrc, &package_ids))
            .await
        {
            Err(e) if !e.is_already_exists() => return Err(e.into()),
            _ => {}
        }

        info!(
            "Created CatalogSourceConfig for {} with packages [{}]",
            opsrc.namespaced_name(),
            package_ids
        );
        Ok(())
    }
}

#[async_trait]
impl PhaseReconciler for ConfiguringReconciler {
    async fn reconcile(&self, opsrc: OperatorSource) -> PhaseOutcome {
        let opsrc = match PhaseOutcome::check_phase(opsrc, PhaseName::Configuring) {
            Ok(opsrc) => opsrc,
            Err(outcome) => return outcome,
        };

        match self.configure(&opsrc).await {
            Ok(()) => PhaseOutcome::advance(opsrc, PhaseName::Succeeded),
            Err(e) => PhaseOutcome::failed(opsrc, e),
        }
    }
}
