//! Marketplace Controller
//!
//! Reconciles `OperatorSource` resources: downloads operator manifests from
//! the configured app registry, keeps them in an in-memory store and publishes
//! them to the cluster as a ConfigMap plus a `CatalogSourceConfig`. A
//! background poller rebuilds sources whose registry content changed.

mod backoff;
mod checker;
mod cluster;
mod config;
mod controller;
mod error;
mod handler;
mod phase;
mod poller;
mod transitioner;
mod watcher;

#[cfg(test)]
mod test_utils;

use config::Config;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configure rustls crypto provider before any TLS connection is made
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Marketplace Controller");

    let config = Config::from_env()?;
    info!("Configuration:");
    info!(
        "  Namespace: {}",
        config.watch_namespace.as_deref().unwrap_or("all namespaces")
    );
    info!("  Registry poll interval: {:?}", config.poll_interval);
    info!("  Failed retry interval: {:?}", config.failed_retry_interval);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
