//! Phase reconcilers.
//!
//! One reconciler per phase of the `OperatorSource` lifecycle. The handler
//! picks the reconciler matching the phase recorded on the object, runs it and
//! applies the phase it asks for.
//!
//! A reconciler returns a [`PhaseOutcome`]: the (possibly modified) object, the
//! next phase (`None` for no transition) and the error that caused a move to
//! `Failed`, if any.

pub(crate) mod builder;
mod configuring;
mod deleted;
mod downloading;
mod failed;
mod initial;
mod prephase;
mod purger;
mod purging;
mod succeeded;
mod validating;


use deleted::DeletedReconciler;
use prephase::PrePhaseReconciler;
use purger::Purger;

use crate::cluster::{ClusterClient, ClusterError};
use crate::transitioner::Clock;
use appregistry_client::{AppRegistryError, ClientFactory};
use async_trait::async_trait;
use crds::{OperatorSource, Phase, PhaseName};
use datastore::{DatastoreError, ManifestStore};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by phase reconcilers.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// The dispatcher routed an object to the wrong reconciler. This is a
    /// bug in the caller, not a condition of the object.
    #[error("wrong reconciler invoked: {reconciler} reconciler called for an object in phase {actual}")]
    WrongReconcilerInvoked {
        /// Phase the invoked reconciler handles
        reconciler: PhaseName,
        /// Phase recorded on the object
        actual: PhaseName,
    },

    /// Registry client failed
    #[error("{0}")]
    Registry(#[from] AppRegistryError),

    /// Manifest datastore failed
    #[error("{0}")]
    Datastore(#[from] DatastoreError),

    /// Cluster operation failed
    #[error("{0}")]
    Cluster(#[from] ClusterError),

    /// Registry namespace holds no operator manifests
    #[error("The operator source endpoint returned an empty manifest list for namespace [{0}]")]
    NoManifests(String),
}

/// Result of running a phase reconciler.
#[derive(Debug)]
pub struct PhaseOutcome {
    /// Object after reconciliation
    pub object: OperatorSource,
    /// Requested phase, `None` for no transition
    pub next_phase: Option<Phase>,
    /// Error that led to `Failed`, or a dispatch error
    pub error: Option<PhaseError>,
}

impl PhaseOutcome {
    /// Nothing to do.
    pub fn unchanged(object: OperatorSource) -> Self {
        Self {
            object,
            next_phase: None,
            error: None,
        }
    }

    /// Move to `name` with its default message.
    pub fn advance(object: OperatorSource, name: PhaseName) -> Self {
        Self {
            object,
            next_phase: Some(Phase::new(name)),
            error: None,
        }
    }

    /// Move to `Failed` carrying the error text.
    pub fn failed(object: OperatorSource, error: impl Into<PhaseError>) -> Self {
        let error = error.into();
        Self {
            object,
            next_phase: Some(Phase::with_message(PhaseName::Failed, error.to_string())),
            error: Some(error),
        }
    }

    /// Guard shared by every phase reconciler: an object whose recorded
    /// phase isn't `expected` comes back untouched with
    /// [`PhaseError::WrongReconcilerInvoked`].
    pub fn check_phase(object: OperatorSource, expected: PhaseName) -> Result<OperatorSource, Self> {
        let actual = object.current_phase_name();
        if actual == expected {
            return Ok(object);
        }
        Err(Self {
            object,
            next_phase: None,
            error: Some(PhaseError::WrongReconcilerInvoked {
                reconciler: expected,
                actual,
            }),
        })
    }
}

/// Reconciles an `OperatorSource` in one particular phase.
#[async_trait]
pub trait PhaseReconciler: Send + Sync {
    /// Reconcile `opsrc` and report the transition to apply.
    async fn reconcile(&self, opsrc: OperatorSource) -> PhaseOutcome;
}

/// Builds the reconciler for a phase.
#[derive(Clone)]
pub struct PhaseReconcilerFactory {
    registry: Arc<dyn ClientFactory>,
    store: Arc<ManifestStore>,
    cluster: Arc<dyn ClusterClient>,
    failed_retry_interval: Duration,
    clock: Clock,
}

impl PhaseReconcilerFactory {
    pub fn new(
        registry: Arc<dyn ClientFactory>,
        store: Arc<ManifestStore>,
        cluster: Arc<dyn ClusterClient>,
        failed_retry_interval: Duration,
        clock: Clock,
    ) -> Self {
        Self {
            registry,
            store,
            cluster,
            failed_retry_interval,
            clock,
        }
    }

    /// Reconciler for objects recorded in `phase`.
    pub fn reconciler_for(&self, phase: PhaseName) -> Box<dyn PhaseReconciler> {
        match phase {
            PhaseName::Initial => Box::new(initial::InitialReconciler),
            PhaseName::Validating => Box::new(validating::ValidatingReconciler),
            PhaseName::Downloading => Box::new(downloading::DownloadingReconciler::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.store),
            )),
            PhaseName::Configuring => Box::new(configuring::ConfiguringReconciler::new(
                Arc::clone(&self.store),
                Arc::clone(&self.cluster),
            )),
            PhaseName::Succeeded => Box::new(succeeded::SucceededReconciler),
            PhaseName::Failed => Box::new(failed::FailedReconciler::new(
                self.failed_retry_interval,
                self.clock,
            )),
            PhaseName::Purging => Box::new(purging::PurgingReconciler::new(self.purger())),
        }
    }

    /// Spec drift / lost cache check run before every phase reconciler.
    pub fn pre_phase(&self) -> PrePhaseReconciler {
        PrePhaseReconciler::new(Arc::clone(&self.store))
    }

    /// Cleanup for deleted objects.
    pub fn deleted(&self) -> DeletedReconciler {
        DeletedReconciler::new(self.purger())
    }

    fn purger(&self) -> Purger {
        Purger::new(Arc::clone(&self.store), Arc::clone(&self.cluster))
    }
}
