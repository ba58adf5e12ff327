use super::PhaseOutcome;
use crds::{OperatorSource, PhaseName};
use datastore::{ManifestStore, Writer};
use kube::ResourceExt;
use std::sync::Arc;
use tracing::info;

/// Runs ahead of every phase reconciler and sends an object to `Purging` when
/// the store no longer matches it: the row is missing (store lost after a
/// restart) or the object's spec was edited since the last download.
///
/// Objects that haven't reached the store write yet (`Initial`, `Validating`,
/// `Downloading`) and objects already `Purging` are left alone. A `Failed`
/// object without a row is too; the failed reconciler retries it.
#[derive(Clone)]
pub struct PrePhaseReconciler {
    store: Arc<ManifestStore>,
}

impl PrePhaseReconciler {
    pub(crate) fn new(store: Arc<ManifestStore>) -> Self {
        Self { store }
    }

    pub fn reconcile(&self, opsrc: OperatorSource) -> PhaseOutcome {
        let phase = opsrc.current_phase_name();
        if matches!(
            phase,
            PhaseName::Initial | PhaseName::Validating | PhaseName::Downloading | PhaseName::Purging
        ) {
            return PhaseOutcome::unchanged(opsrc);
        }

        let uid = opsrc.uid().unwrap_or_default();
        let stale = match self.store.get_operator_source(&uid) {
            None if phase == PhaseName::Failed => false,
            None => {
                info!("No stored manifests for {}, purging", opsrc.namespaced_name());
                true
            }
            Some(record) if !record.spec.is_equal(&opsrc.spec) => {
                info!("Spec of {} changed, purging", opsrc.namespaced_name());
                true
            }
            Some(_) => false,
        };

        if stale {
            PhaseOutcome::advance(opsrc, PhaseName::Purging)
        } else {
            PhaseOutcome::unchanged(opsrc)
        }
    }
}
