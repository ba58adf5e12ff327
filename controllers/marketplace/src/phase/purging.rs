use super::purger::Purger;
use super::{PhaseOutcome, PhaseReconciler};
use async_trait::async_trait;
use crds::{OperatorSource, PhaseName};
use tracing::info;

/// Clears everything built from the previous download and starts over.
pub(crate) struct PurgingReconciler {
    purger: Purger,
}

impl PurgingReconciler {
    pub(crate) fn new(purger: Purger) -> Self {
        Self { purger }
    }
}

#[async_trait]
impl PhaseReconciler for PurgingReconciler {
    async fn reconcile(&self, opsrc: OperatorSource) -> PhaseOutcome {
        let mut opsrc = match PhaseOutcome::check_phase(opsrc, PhaseName::Purging) {
            Ok(opsrc) => opsrc,
            Err(outcome) => return outcome,
        };

        if let Err(e) = self.purger.purge(&opsrc).await {
            return PhaseOutcome::failed(opsrc, e);
        }

        info!("Purged {}, starting over", opsrc.namespaced_name());
        // Status is rebuilt from scratch on the way back through Validating.
        opsrc.status = None;
        PhaseOutcome::advance(opsrc, PhaseName::Validating)
    }
}
