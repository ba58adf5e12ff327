//! Periodic drift detection.
//!
//! Every tick walks the sources held by the store, asks each registry whether
//! anything changed and moves changed sources to `Purging`. A failing source
//! is logged and skipped.

use crate::checker::{TriggerResult, UpdateChecker};
use datastore::{ManifestStore, Writer};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Drift poller
pub struct Poller {
    checker: UpdateChecker,
    store: Arc<ManifestStore>,
    interval: Duration,
}

impl Poller {
    pub fn new(checker: UpdateChecker, store: Arc<ManifestStore>, interval: Duration) -> Self {
        Self {
            checker,
            store,
            interval,
        }
    }

    /// Run one pass over all stored sources.
    pub async fn poll(&self) {
        for source in self.store.get_all_operator_sources() {
            let name = format!("{}/{}", source.namespace, source.name);

            let updated = match self.checker.check(&source.uid).await {
                Ok(updated) => updated,
                Err(e) => {
                    error!("[sync] error checking for updates [{}]: {}", name, e);
                    continue;
                }
            };
            if !updated {
                debug!("[sync] no upstream changes for [{}]", name);
                continue;
            }

            info!("[sync] remote registry has update(s), purging [{}]", name);
            match self.checker.trigger(&source.namespace, &source.name).await {
                Ok(TriggerResult::Deleted) => info!("[sync] object deleted [{}], no action taken", name),
                Ok(TriggerResult::Downloading) => {
                    info!("[sync] [{}] is downloading, not interrupting", name);
                }
                Ok(TriggerResult::Purging | TriggerResult::Unchanged) => {}
                Err(e) => error!("[sync] error updating object [{}]: {}", name, e),
            }
        }
    }

    /// Poll every interval until `cancel` fires. The first poll happens one
    /// interval after start.
    pub async fn run(&self, cancel: CancellationToken) {
        info!("Starting registry poller (interval {:?})", self.interval);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("Registry poller stopped");
                    return;
                }
                _ = ticker.tick() => self.poll().await,
            }
        }
    }
}
