use super::{PhaseOutcome, PhaseReconciler};
use async_trait::async_trait;
use crds::{OperatorSource, PhaseName};

pub(crate) struct SucceededReconciler;

#[async_trait]
impl PhaseReconciler for SucceededReconciler {
    async fn reconcile(&self, opsrc: OperatorSource) -> PhaseOutcome {
        match PhaseOutcome::check_phase(opsrc, PhaseName::Succeeded) {
            Ok(opsrc) => PhaseOutcome::unchanged(opsrc),
            Err(outcome) => outcome,
        }
    }
}
