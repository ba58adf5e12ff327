use super::{PhaseError, PhaseOutcome, PhaseReconciler};
use appregistry_client::{ClientFactory, OperatorMetadata};
use async_trait::async_trait;
use crds::{OperatorSource, PhaseName};
use datastore::{ManifestStore, SourceRecord, Writer};
use std::sync::Arc;
use tracing::{info, warn};

/// Downloads every repository in the source's registry namespace and writes
/// it to the store.
pub(crate) struct DownloadingReconciler {
    registry: Arc<dyn ClientFactory>,
    store: Arc<ManifestStore>,
}

impl DownloadingReconciler {
    pub(crate) fn new(registry: Arc<dyn ClientFactory>, store: Arc<ManifestStore>) -> Self {
        Self { registry, store }
    }

    async fn download(&self, opsrc: &OperatorSource) -> Result<Vec<OperatorMetadata>, PhaseError> {
        let spec = &opsrc.spec;
        let client = self.registry.new_client(&spec.source_type, &spec.endpoint)?;
        let manifests = client.retrieve_all(&spec.registry_namespace).await?;

        // An empty listing still replaces the previous row.
        let record = SourceRecord::from_resource(opsrc)?;
        self.store.write(&record, &manifests)?;
        Ok(manifests)
    }
}

#[async_trait]
impl PhaseReconciler for DownloadingReconciler {
    async fn reconcile(&self, opsrc: OperatorSource) -> PhaseOutcome {
        let opsrc = match PhaseOutcome::check_phase(opsrc, PhaseName::Downloading) {
            Ok(opsrc) => opsrc,
            Err(outcome) => return outcome,
        };

        info!(
            "Downloading manifests for {} from {} (namespace {})",
            opsrc.namespaced_name(),
            opsrc.spec.endpoint,
            opsrc.spec.registry_namespace
        );

        match self.download(&opsrc).await {
            Ok(manifests) if manifests.is_empty() => {
                warn!("No manifests found for {}", opsrc.namespaced_name());
                let namespace = opsrc.spec.registry_namespace.clone();
                PhaseOutcome::failed(opsrc, PhaseError::NoManifests(namespace))
            }
            Ok(manifests) => {
                info!(
                    "Downloaded {} repositories for {}",
                    manifests.len(),
                    opsrc.namespaced_name()
                );
                PhaseOutcome::advance(opsrc, PhaseName::Configuring)
            }
            Err(e) => {
                warn!("Download failed for {}: {}", opsrc.namespaced_name(), e);
                PhaseOutcome::failed(opsrc, e)
            }
        }
    }
}
