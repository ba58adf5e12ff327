//! Reconciliation dispatcher.
//!
//! Runs the pre-phase check and then the reconciler matching the object's
//! recorded phase, applies the phase it asks for and persists the status.

use crate::cluster::ClusterClient;
use crate::phase::{PhaseError, PhaseOutcome, PhaseReconcilerFactory};
use crate::transitioner::Transitioner;
use crds::OperatorSource;
use std::sync::Arc;
use tracing::{debug, error};

/// Dispatches `OperatorSource` events to phase reconcilers.
pub struct Handler {
    factory: PhaseReconcilerFactory,
    cluster: Arc<dyn ClusterClient>,
    transitioner: Transitioner,
}

impl Handler {
    pub fn new(factory: PhaseReconcilerFactory, cluster: Arc<dyn ClusterClient>, transitioner: Transitioner) -> Self {
        Self {
            factory,
            cluster,
            transitioner,
        }
    }

    /// Handle one event for `opsrc`.
    ///
    /// When the pre-phase check asks for a transition it is applied and the
    /// phase reconciler does not run for this event.
    ///
    /// # Errors
    ///
    /// The reconciliation error if there was one, otherwise a failure to
    /// persist the new status.
    pub async fn handle(&self, opsrc: &OperatorSource) -> Result<(), PhaseError> {
        let outcome = self.factory.pre_phase().reconcile(opsrc.clone());
        if outcome.error.is_some() || outcome.next_phase.is_some() {
            return self.transition(outcome).await;
        }

        let phase = opsrc.current_phase_name();
        debug!("Reconciling {} in phase {}", opsrc.namespaced_name(), phase);
        let outcome = self.factory.reconciler_for(phase).reconcile(opsrc.clone()).await;
        self.transition(outcome).await
    }

    /// Clean up after a deleted `opsrc`.
    ///
    /// # Errors
    ///
    /// Cluster errors other than not-found while deleting artifacts.
    pub async fn handle_deleted(&self, opsrc: &OperatorSource) -> Result<(), PhaseError> {
        self.factory.deleted().reconcile(opsrc).await
    }

    async fn transition(&self, outcome: PhaseOutcome) -> Result<(), PhaseError> {
        let PhaseOutcome {
            mut object,
            next_phase,
            error: reconciliation_error,
        } = outcome;

        let Some(next_phase) = next_phase else {
            return reconciliation_error.map_or(Ok(()), Err);
        };

        let status = object.status.get_or_insert_with(Default::default);
        if !self.transitioner.transition_into(&mut status.current_phase, &next_phase) {
            return reconciliation_error.map_or(Ok(()), Err);
        }

        debug!("{} moves to phase {}", object.namespaced_name(), next_phase.name);
        let Err(update_error) = self.cluster.update_operator_source_status(&object).await else {
            return reconciliation_error.map_or(Ok(()), Err);
        };

        match reconciliation_error {
            Some(reconciliation_error) => {
                error!(
                    "Failed to update status of {}: {}",
                    object.namespaced_name(),
                    update_error
                );
                Err(reconciliation_error)
            }
            None => Err(update_error.into()),
        }
    }
}
