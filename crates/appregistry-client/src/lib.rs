//! App-Registry Client
//!
//! A client for the app-registry (CNR) HTTP API used by operator sources.
//! Lists the operator repositories published under a registry namespace and
//! downloads their manifest blobs.
//!
//! # Example
//!
//! ```no_run
//! use appregistry_client::{AppRegistryClientFactory, ClientFactory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = AppRegistryClientFactory::default();
//! let client = factory.new_client("appregistry", "https://quay.io/cnr")?;
//!
//! // What is published upstream
//! let listing = client.list_packages("community-operators").await?;
//!
//! // Every repository's manifest blob
//! let blobs = client.retrieve_all("community-operators").await?;
//! # Ok(())
//! # }
//! ```

pub mod blob;
pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod registry_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{AppRegistryClient, AppRegistryClientFactory};
pub use error::AppRegistryError;
pub use models::*;
pub use registry_trait::{ClientFactory, RegistryClientTrait};
#[cfg(feature = "test-util")]
pub use mock::{MockClientFactory, MockRegistryClient};
