use super::PhaseError;
use super::purger::Purger;
use crds::OperatorSource;
use tracing::info;

/// Cleans up after an `OperatorSource` removed from the cluster.
#[derive(Clone)]
pub struct DeletedReconciler {
    purger: Purger,
}

impl DeletedReconciler {
    pub(crate) fn new(purger: Purger) -> Self {
        Self { purger }
    }

    /// Purge the artifacts of a deleted object. There is no phase to move to.
    ///
    /// # Errors
    ///
    /// Cluster errors other than not-found.
    pub async fn reconcile(&self, opsrc: &OperatorSource) -> Result<(), PhaseError> {
        self.purger.purge(opsrc).await?;
        info!("OperatorSource {} deleted, artifacts removed", opsrc.namespaced_name());
        Ok(())
    }
}
