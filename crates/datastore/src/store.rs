//! In-memory manifest store
//!
//! One row per `OperatorSource`, keyed by UID. A write replaces the whole row
//! and a read bundles packages from any row into one document.

use crate::codec;
use crate::decomposer::decompose;
use crate::error::DatastoreError;
use crate::manifest::{
    RawOperatorManifestData, SingleOperatorManifest, StructuredOperatorManifestData,
};
use appregistry_client::{OperatorMetadata, PackageMetadata, RegistryMetadata};
use crds::{OperatorSource, OperatorSourceSpec};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Identity and spec snapshot of the operator source a row belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Object UID, the row key
    pub uid: String,
    /// Object namespace
    pub namespace: String,
    /// Object name
    pub name: String,
    /// Spec the manifests were downloaded for
    pub spec: OperatorSourceSpec,
}

impl SourceRecord {
    /// Snapshot an `OperatorSource`.
    ///
    /// # Errors
    ///
    /// `MissingUid` if the object was never persisted.
    pub fn from_resource(opsrc: &OperatorSource) -> Result<Self, DatastoreError> {
        let name = opsrc.metadata.name.clone().unwrap_or_default();
        let uid = opsrc
            .metadata
            .uid
            .clone()
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| DatastoreError::MissingUid(name.clone()))?;

        Ok(Self {
            uid,
            namespace: opsrc.metadata.namespace.clone().unwrap_or_default(),
            name,
            spec: opsrc.spec.clone(),
        })
    }
}

/// Bundles stored packages into a single manifest document.
pub trait Reader: Send + Sync {
    /// Combined manifest for `package_ids`, sections ordered as requested.
    ///
    /// # Errors
    ///
    /// `PackageNotFound` for an unknown ID, `DuplicatePackage` for an ID
    /// listed twice.
    fn read(&self, package_ids: &[String]) -> Result<RawOperatorManifestData, DatastoreError>;
}

/// Maintains the per-source rows.
pub trait Writer: Send + Sync {
    /// Decompose `manifests` and replace the row of `source` with the result.
    /// On error the previous row is left untouched.
    ///
    /// # Errors
    ///
    /// Decoding or decomposition failure, or a package defined twice.
    fn write(&self, source: &SourceRecord, manifests: &[OperatorMetadata]) -> Result<(), DatastoreError>;

    /// Comma separated, sorted package IDs owned by one source.
    fn get_package_ids(&self, uid: &str) -> String;

    /// Comma separated, sorted package IDs across all sources.
    fn get_all_package_ids(&self) -> String;

    /// Drop the row of a source. Absent rows are ignored.
    fn remove(&self, uid: &str);

    /// Snapshot stored for a source.
    fn get_operator_source(&self, uid: &str) -> Option<SourceRecord>;

    /// Snapshots of every stored source, ordered by UID.
    fn get_all_operator_sources(&self) -> Vec<SourceRecord>;

    /// Whether `listing` differs from what the row was built from.
    ///
    /// # Errors
    ///
    /// `SourceNotFound` when there is no row for `uid`.
    fn has_update(&self, uid: &str, listing: &[PackageMetadata]) -> Result<bool, DatastoreError>;
}

#[derive(Debug, Clone)]
struct OperatorSourceRow {
    source: SourceRecord,
    metadata: Vec<RegistryMetadata>,
    operators: BTreeMap<String, SingleOperatorManifest>,
}

/// Process-wide manifest cache.
#[derive(Debug, Default)]
pub struct ManifestStore {
    rows: RwLock<BTreeMap<String, OperatorSourceRow>>,
}

impl ManifestStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_rows(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, OperatorSourceRow>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_rows(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, OperatorSourceRow>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn decompose_all(
        manifests: &[OperatorMetadata],
    ) -> Result<BTreeMap<String, SingleOperatorManifest>, DatastoreError> {
        let mut operators = BTreeMap::new();
        for manifest in manifests {
            let document = codec::unmarshal(&manifest.raw_yaml)?;
            let data = codec::unmarshal_data(&document.data)?;
            for bundle in decompose(&data)? {
                let package_id = bundle.package_id().to_string();
                if operators.contains_key(&package_id) {
                    return Err(DatastoreError::ConflictingPackage(package_id));
                }
                operators.insert(package_id, bundle);
            }
            debug!("Decomposed repository {}", manifest.metadata.id());
        }
        Ok(operators)
    }
}

fn join_sorted<'a>(ids: impl Iterator<Item = &'a String>) -> String {
    let ids: BTreeSet<&str> = ids.map(String::as_str).collect();
    ids.into_iter().collect::<Vec<_>>().join(",")
}

impl Reader for ManifestStore {
    fn read(&self, package_ids: &[String]) -> Result<RawOperatorManifestData, DatastoreError> {
        let rows = self.read_rows();

        let mut bundles = Vec::with_capacity(package_ids.len());
        let mut requested = HashSet::new();
        for package_id in package_ids {
            // Rows are scanned in UID order, first match wins
            let bundle = rows
                .values()
                .find_map(|row| row.operators.get(package_id))
                .ok_or_else(|| DatastoreError::PackageNotFound(package_id.clone()))?;

            if !requested.insert(package_id.as_str()) {
                return Err(DatastoreError::DuplicatePackage(package_id.clone()));
            }
            bundles.push(bundle);
        }

        let mut combined = StructuredOperatorManifestData::default();
        let mut seen_crds = HashSet::new();
        for bundle in bundles {
            for crd in &bundle.custom_resource_definitions {
                if seen_crds.insert(crd.name()) {
                    combined.custom_resource_definitions.push(crd.clone());
                }
            }
            combined
                .cluster_service_versions
                .extend(bundle.cluster_service_versions.iter().cloned());
            combined.packages.push(bundle.package.clone());
        }
        drop(rows);

        codec::marshal(&combined)
    }
}

impl Writer for ManifestStore {
    fn write(&self, source: &SourceRecord, manifests: &[OperatorMetadata]) -> Result<(), DatastoreError> {
        let operators = Self::decompose_all(manifests)?;
        debug!(
            "Storing {} package(s) for operator source {}/{}",
            operators.len(),
            source.namespace,
            source.name
        );

        let row = OperatorSourceRow {
            source: source.clone(),
            metadata: manifests.iter().map(|m| m.metadata.clone()).collect(),
            operators,
        };
        self.write_rows().insert(source.uid.clone(), row);
        Ok(())
    }

    fn get_package_ids(&self, uid: &str) -> String {
        self.read_rows()
            .get(uid)
            .map(|row| join_sorted(row.operators.keys()))
            .unwrap_or_default()
    }

    fn get_all_package_ids(&self) -> String {
        let rows = self.read_rows();
        join_sorted(rows.values().flat_map(|row| row.operators.keys()))
    }

    fn remove(&self, uid: &str) {
        self.write_rows().remove(uid);
    }

    fn get_operator_source(&self, uid: &str) -> Option<SourceRecord> {
        self.read_rows().get(uid).map(|row| row.source.clone())
    }

    fn get_all_operator_sources(&self) -> Vec<SourceRecord> {
        self.read_rows()
            .values()
            .map(|row| row.source.clone())
            .collect()
    }

    fn has_update(&self, uid: &str, listing: &[PackageMetadata]) -> Result<bool, DatastoreError> {
        let rows = self.read_rows();
        let row = rows
            .get(uid)
            .ok_or_else(|| DatastoreError::SourceNotFound(uid.to_string()))?;

        let key = |m: &RegistryMetadata| (m.repository.clone(), m.release.clone(), m.digest.clone());
        let stored: BTreeSet<_> = row.metadata.iter().map(key).collect();
        let upstream: BTreeSet<_> = listing.iter().map(key).collect();
        Ok(stored != upstream)
    }
}
