//! Operator Manifest Datastore
//!
//! In-memory cache of the operator manifests downloaded for each
//! `OperatorSource`. A registry blob describing many operators is decomposed
//! into one bundle per package on write, and any subset of packages can be
//! bundled back into a single document on read.
//!
//! The store lives as long as the controller process. Nothing is persisted.

pub mod codec;
pub mod decomposer;
pub mod error;
pub mod manifest;
pub mod store;

#[cfg(test)]
mod testdata;

pub use decomposer::decompose;
pub use error::DatastoreError;
pub use manifest::*;
pub use store::{ManifestStore, Reader, SourceRecord, Writer};
