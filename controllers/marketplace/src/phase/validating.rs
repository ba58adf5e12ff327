use super::{PhaseOutcome, PhaseReconciler};
use async_trait::async_trait;
use crds::{OperatorSource, PhaseName};
use tracing::debug;

/// Validation is a pass-through for now; every object proceeds to download.
pub(crate) struct ValidatingReconciler;

#[async_trait]
impl PhaseReconciler for ValidatingReconciler {
    async fn reconcile(&self, opsrc: OperatorSource) -> PhaseOutcome {
        let opsrc = match PhaseOutcome::check_phase(opsrc, PhaseName::Validating) {
            Ok(opsrc) => opsrc,
            Err(outcome) => return outcome,
        };

        debug!("OperatorSource {} validated", opsrc.namespaced_name());
        PhaseOutcome::advance(opsrc, PhaseName::Downloading)
    }
}
