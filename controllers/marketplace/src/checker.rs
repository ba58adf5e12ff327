//! Upstream update detection for stored operator sources.

use crate::cluster::{ClusterClient, ClusterError};
use crate::error::ControllerError;
use crate::transitioner::Transitioner;
use appregistry_client::ClientFactory;
use crds::{Phase, PhaseName};
use datastore::{DatastoreError, ManifestStore, SourceRecord, Writer};
use std::sync::Arc;
use tracing::debug;

/// Message recorded when a source is purged because upstream changed
pub const REMOTE_UPDATED_MESSAGE: &str = "Remote registry has been updated";

/// Fresh reads attempted after a conflicting status write
const CONFLICT_RETRIES: usize = 2;

/// What [`UpdateChecker::trigger`] did with the live object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerResult {
    /// Moved to `Purging`
    Purging,
    /// Already in `Purging` with the same message
    Unchanged,
    /// Left alone while its first download is running
    Downloading,
    /// Gone from the cluster
    Deleted,
}

/// Compares stored sources against their registries and schedules rebuilds.
pub struct UpdateChecker {
    registry: Arc<dyn ClientFactory>,
    store: Arc<ManifestStore>,
    cluster: Arc<dyn ClusterClient>,
    transitioner: Transitioner,
}

impl UpdateChecker {
    pub fn new(
        registry: Arc<dyn ClientFactory>,
        store: Arc<ManifestStore>,
        cluster: Arc<dyn ClusterClient>,
        transitioner: Transitioner,
    ) -> Self {
        Self {
            registry,
            store,
            cluster,
            transitioner,
        }
    }

    /// Whether the registry listing for the source `uid` differs from what
    /// was downloaded.
    ///
    /// # Errors
    ///
    /// The source is unknown to the store, or the registry can't be listed.
    pub async fn check(&self, uid: &str) -> Result<bool, ControllerError> {
        let SourceRecord { spec, .. } = self
            .store
            .get_operator_source(uid)
            .ok_or_else(|| DatastoreError::SourceNotFound(uid.to_string()))?;

        let client = self.registry.new_client(&spec.source_type, &spec.endpoint)?;
        let listing = client.list_packages(&spec.registry_namespace).await?;
        Ok(self.store.has_update(uid, &listing)?)
    }

    /// Move the live object `namespace/name` to `Purging`.
    ///
    /// A write rejected because the object changed since it was read is
    /// retried on a fresh copy, so a concurrent reconcile is never
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Fetching or updating the object failed for a reason other than it
    /// being gone, or it kept changing under the update.
    pub async fn trigger(&self, namespace: &str, name: &str) -> Result<TriggerResult, ClusterError> {
        let mut retries = 0;
        loop {
            match self.try_trigger(namespace, name).await {
                Err(e) if e.is_conflict() && retries < CONFLICT_RETRIES => {
                    retries += 1;
                    debug!("{}/{} changed while scheduling purge, retrying", namespace, name);
                }
                result => return result,
            }
        }
    }

    async fn try_trigger(&self, namespace: &str, name: &str) -> Result<TriggerResult, ClusterError> {
        let mut opsrc = match self.cluster.get_operator_source(namespace, name).await {
            Ok(opsrc) => opsrc,
            Err(e) if e.is_not_found() => return Ok(TriggerResult::Deleted),
            Err(e) => return Err(e),
        };

        if opsrc.current_phase_name() == PhaseName::Downloading {
            return Ok(TriggerResult::Downloading);
        }

        let next = Phase::with_message(PhaseName::Purging, REMOTE_UPDATED_MESSAGE);
        let status = opsrc.status.get_or_insert_with(Default::default);
        if !self.transitioner.transition_into(&mut status.current_phase, &next) {
            return Ok(TriggerResult::Unchanged);
        }

        debug!("Scheduling {}/{} for purging", namespace, name);
        self.cluster.update_operator_source_status(&opsrc).await?;
        Ok(TriggerResult::Purging)
    }
}
