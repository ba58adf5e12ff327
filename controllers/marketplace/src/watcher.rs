//! Kubernetes resource watchers.
//!
//! `OperatorSource` events are driven through `kube_runtime::Controller`, which
//! serializes reconciliations per object and requeues on error. Deletions are
//! picked up from a plain watch stream since the controller never sees an
//! object after it is gone.

use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use crate::handler::Handler;
use crate::phase::PhaseError;
use crds::{OperatorSource, PhaseName};
use futures::{StreamExt, TryStreamExt};
use kube::Api;
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::{Controller, watcher};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// State shared by reconcile and error policy calls.
pub struct Context {
    handler: Arc<Handler>,
    /// Per-object error backoff (namespace/name -> backoff)
    backoff_states: Mutex<HashMap<String, FibonacciBackoff>>,
    failed_retry_interval: Duration,
}

impl Context {
    pub fn new(handler: Arc<Handler>, failed_retry_interval: Duration) -> Self {
        Self {
            handler,
            backoff_states: Mutex::new(HashMap::new()),
            failed_retry_interval,
        }
    }

    fn next_backoff(&self, key: &str) -> Duration {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .next_backoff()
    }

    fn reset_backoff(&self, key: &str) {
        if let Some(backoff) = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(key)
        {
            backoff.reset();
        }
    }

    fn forget(&self, key: &str) {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Requeue policy after a successful pass. Failed objects are looked at
    /// again once their retry interval is up; everything else waits for the
    /// next change, which includes the status update of a transition.
    fn action_after(&self, opsrc: &OperatorSource) -> Action {
        if opsrc.current_phase_name() == PhaseName::Failed {
            Action::requeue(self.failed_retry_interval)
        } else {
            Action::await_change()
        }
    }
}

async fn reconcile(opsrc: Arc<OperatorSource>, ctx: Arc<Context>) -> Result<Action, PhaseError> {
    let key = opsrc.namespaced_name();
    debug!("Reconciling OperatorSource {}", key);

    ctx.handler.handle(&opsrc).await?;
    ctx.reset_backoff(&key);
    Ok(ctx.action_after(&opsrc))
}

fn error_policy(opsrc: Arc<OperatorSource>, error: &PhaseError, ctx: Arc<Context>) -> Action {
    let key = opsrc.namespaced_name();
    let delay = match error {
        // Failed is already recorded; retry on the failed schedule
        PhaseError::Registry(_) | PhaseError::Datastore(_) | PhaseError::NoManifests(_) => {
            ctx.failed_retry_interval
        }
        PhaseError::WrongReconcilerInvoked { .. } | PhaseError::Cluster(_) => ctx.next_backoff(&key),
    };
    error!(
        "Reconciliation of OperatorSource {} failed: {} (retry in {:?})",
        key, error, delay
    );
    Action::requeue(delay)
}

/// Watches `OperatorSource` resources.
pub struct Watcher {
    api: Api<OperatorSource>,
    context: Arc<Context>,
}

impl Watcher {
    pub fn new(api: Api<OperatorSource>, context: Arc<Context>) -> Self {
        Self { api, context }
    }

    /// Reconcile `OperatorSource` events until the watch ends.
    pub async fn watch_operator_sources(&self) -> Result<(), ControllerError> {
        info!("Starting OperatorSource watcher");

        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(1))
            .concurrency(3);

        Controller::new(self.api.clone(), watcher::Config::default())
            .with_config(controller_config)
            .run(reconcile, error_policy, Arc::clone(&self.context))
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => debug!("Reconciled OperatorSource {}", obj.name),
                    Err(e) => warn!("OperatorSource controller error: {}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Clean up artifacts of deleted `OperatorSource` objects.
    pub async fn watch_deletions(&self) -> Result<(), ControllerError> {
        info!("Starting OperatorSource deletion watcher");

        let mut stream = Box::pin(watcher(self.api.clone(), watcher::Config::default()));

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| ControllerError::Watch(format!("OperatorSource watch stream error: {e}")))?
        {
            match event {
                watcher::Event::Delete(opsrc) => {
                    let key = opsrc.namespaced_name();
                    info!("OperatorSource deleted: {}", key);
                    self.context.forget(&key);
                    if let Err(e) = self.context.handler.handle_deleted(&opsrc).await {
                        error!("Failed to clean up after OperatorSource {}: {}", key, e);
                    }
                }
                watcher::Event::Init => debug!("OperatorSource deletion watcher initializing"),
                watcher::Event::InitDone => info!("OperatorSource deletion watcher initialized"),
                watcher::Event::Apply(_) | watcher::Event::InitApply(_) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseReconcilerFactory;
    use crate::test_utils::{MockClusterClient, fixed_now, operator_source};
    use crate::transitioner::Transitioner;
    use appregistry_client::MockClientFactory;
    use datastore::ManifestStore;

    fn context() -> Context {
        let cluster = Arc::new(MockClusterClient::new());
        let factory = PhaseReconcilerFactory::new(
            Arc::new(MockClientFactory::default()),
            Arc::new(ManifestStore::new()),
            Arc::clone(&cluster) as Arc<dyn crate::cluster::ClusterClient>,
            Duration::from_secs(60),
            fixed_now,
        );
        let handler = Handler::new(factory, cluster, Transitioner::with_clock(fixed_now));
        Context::new(Arc::new(handler), Duration::from_secs(60))
    }

    #[test]
    fn test_failed_objects_are_requeued() {
        let ctx = context();
        let failed = operator_source("marketplace", "foo", PhaseName::Failed);
        let succeeded = operator_source("marketplace", "foo", PhaseName::Succeeded);

        assert_eq!(ctx.action_after(&failed), Action::requeue(Duration::from_secs(60)));
        assert_eq!(ctx.action_after(&succeeded), Action::await_change());
    }

    #[test]
    fn test_backoff_is_per_object_and_resets() {
        let ctx = context();

        assert_eq!(ctx.next_backoff("ns/a"), Duration::from_secs(5));
        assert_eq!(ctx.next_backoff("ns/a"), Duration::from_secs(5));
        assert_eq!(ctx.next_backoff("ns/a"), Duration::from_secs(10));
        assert_eq!(ctx.next_backoff("ns/b"), Duration::from_secs(5));

        ctx.reset_backoff("ns/a");
        assert_eq!(ctx.next_backoff("ns/a"), Duration::from_secs(5));

        ctx.forget("ns/b");
        assert!(!ctx.backoff_states.lock().unwrap().contains_key("ns/b"));
    }

    #[test]
    fn test_error_policy_uses_failed_interval_for_recorded_failures() {
        let ctx = Arc::new(context());
        let opsrc = Arc::new(operator_source("marketplace", "foo", PhaseName::Downloading));

        let action = error_policy(
            Arc::clone(&opsrc),
            &PhaseError::NoManifests("community".to_string()),
            Arc::clone(&ctx),
        );
        assert_eq!(action, Action::requeue(Duration::from_secs(60)));

        let action = error_policy(
            opsrc,
            &PhaseError::WrongReconcilerInvoked {
                reconciler: PhaseName::Succeeded,
                actual: PhaseName::Downloading,
            },
            ctx,
        );
        assert_eq!(action, Action::requeue(Duration::from_secs(5)));
    }
}
