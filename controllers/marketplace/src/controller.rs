//! Main controller implementation.
//!
//! Wires the store, registry client factory and cluster client into the
//! handler, then runs the watchers and the registry poller until shutdown.

use crate::checker::UpdateChecker;
use crate::cluster::{ClusterClient, KubeClusterClient};
use crate::config::Config;
use crate::error::ControllerError;
use crate::handler::Handler;
use crate::phase::PhaseReconcilerFactory;
use crate::poller::Poller;
use crate::transitioner::Transitioner;
use crate::watcher::{Context, Watcher};
use appregistry_client::{AppRegistryClientFactory, ClientFactory};
use crds::OperatorSource;
use datastore::ManifestStore;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Main controller for OperatorSource resources.
pub struct Controller {
    operator_source_watcher: JoinHandle<Result<(), ControllerError>>,
    deletion_watcher: JoinHandle<Result<(), ControllerError>>,
    poller: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl Controller {
    /// Creates a new controller instance and starts its tasks.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing Marketplace Controller");

        let kube_client = Client::try_default().await?;
        let api: Api<OperatorSource> = match config.watch_namespace.as_deref() {
            Some(namespace) => Api::namespaced(kube_client.clone(), namespace),
            None => Api::all(kube_client.clone()),
        };

        // Lives as long as the process; rebuilt from the cluster after a restart.
        let store = Arc::new(ManifestStore::new());
        let registry: Arc<dyn ClientFactory> = Arc::new(AppRegistryClientFactory);
        let cluster: Arc<dyn ClusterClient> = Arc::new(KubeClusterClient::new(kube_client));
        let transitioner = Transitioner::default();

        let factory = PhaseReconcilerFactory::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            Arc::clone(&cluster),
            config.failed_retry_interval,
            chrono::Utc::now,
        );
        let handler = Arc::new(Handler::new(factory, Arc::clone(&cluster), transitioner));
        let context = Arc::new(Context::new(handler, config.failed_retry_interval));
        let watcher = Arc::new(Watcher::new(api, context));

        let operator_source_watcher = {
            let watcher = Arc::clone(&watcher);
            tokio::spawn(async move { watcher.watch_operator_sources().await })
        };

        let deletion_watcher = {
            let watcher = Arc::clone(&watcher);
            tokio::spawn(async move { watcher.watch_deletions().await })
        };

        let shutdown = CancellationToken::new();
        let poller = {
            let checker = UpdateChecker::new(registry, Arc::clone(&store), cluster, transitioner);
            let poller = Poller::new(checker, store, config.poll_interval);
            let cancel = shutdown.clone();
            tokio::spawn(async move { poller.run(cancel).await })
        };

        Ok(Self {
            operator_source_watcher,
            deletion_watcher,
            poller,
            shutdown,
        })
    }

    /// Runs the controller until a watcher exits or the process is
    /// interrupted.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Marketplace Controller running");

        let result = tokio::select! {
            result = &mut self.operator_source_watcher => {
                result
                    .map_err(|e| ControllerError::Watch(format!("OperatorSource watcher panicked: {e}")))
                    .and_then(|r| r)
            }
            result = &mut self.deletion_watcher => {
                result
                    .map_err(|e| ControllerError::Watch(format!("OperatorSource deletion watcher panicked: {e}")))
                    .and_then(|r| r)
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                Ok(())
            }
        };

        self.shutdown.cancel();
        if let Err(e) = self.poller.await {
            warn!("Registry poller panicked: {}", e);
        }
        self.operator_source_watcher.abort();
        self.deletion_watcher.abort();

        info!("Marketplace Controller stopped");
        result
    }
}
