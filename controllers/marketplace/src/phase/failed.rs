use super::{PhaseOutcome, PhaseReconciler};
use crate::transitioner::Clock;
use async_trait::async_trait;
use crds::{OperatorSource, PhaseName};
use std::time::Duration;
use tracing::info;

/// Retries a failed object once `retry_interval` has passed since it entered
/// `Failed`.
pub(crate) struct FailedReconciler {
    retry_interval: Duration,
    clock: Clock,
}

impl FailedReconciler {
    pub(crate) fn new(retry_interval: Duration, clock: Clock) -> Self {
        Self { retry_interval, clock }
    }

    fn retry_due(&self, opsrc: &OperatorSource) -> bool {
        let Some(failed_at) = opsrc
            .status
            .as_ref()
            .and_then(|s| s.current_phase.last_transition_time)
        else {
            return true;
        };
        let elapsed = (self.clock)().signed_duration_since(failed_at);
        elapsed.to_std().is_ok_and(|elapsed| elapsed >= self.retry_interval)
    }
}

#[async_trait]
impl PhaseReconciler for FailedReconciler {
    async fn reconcile(&self, opsrc: OperatorSource) -> PhaseOutcome {
        let opsrc = match PhaseOutcome::check_phase(opsrc, PhaseName::Failed) {
            Ok(opsrc) => opsrc,
            Err(outcome) => return outcome,
        };

        if !self.retry_due(&opsrc) {
            return PhaseOutcome::unchanged(opsrc);
        }

        info!("Retrying failed OperatorSource {}", opsrc.namespaced_name());
        PhaseOutcome::advance(opsrc, PhaseName::Validating)
    }
}
