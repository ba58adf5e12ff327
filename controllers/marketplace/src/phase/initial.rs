use super::{PhaseOutcome, PhaseReconciler};
use async_trait::async_trait;
use crds::{OperatorSource, PhaseName};
use tracing::info;

/// Newly created objects go straight to validation.
pub(crate) struct InitialReconciler;

#[async_trait]
impl PhaseReconciler for InitialReconciler {
    async fn reconcile(&self, opsrc: OperatorSource) -> PhaseOutcome {
        let opsrc = match PhaseOutcome::check_phase(opsrc, PhaseName::Initial) {
            Ok(opsrc) => opsrc,
            Err(outcome) => return outcome,
        };

        info!("OperatorSource {} created, scheduling validation", opsrc.namespaced_name());
        PhaseOutcome::advance(opsrc, PhaseName::Validating)
    }
}
