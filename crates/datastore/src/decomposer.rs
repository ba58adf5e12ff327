//! Manifest decomposition
//!
//! Splits a multi-operator manifest into one [`SingleOperatorManifest`] per
//! package. For example a blob describing `etcd`, `prometheus` and `amq`
//! yields three bundles, each carrying its package section plus the CSVs and
//! CRDs that package needs.
//!
//! Per package:
//! 1. every channel head is resolved by name
//! 2. the `replaces` chain is walked back from the head until it ends
//! 3. CSVs from all channels are unioned in first-seen order
//! 4. owned then required CRDs of those CSVs are resolved and unioned

use crate::error::DatastoreError;
use crate::manifest::{
    ClusterServiceVersion, CustomResourceDefinition, PackageChannel, PackageManifest,
    SingleOperatorManifest, StructuredOperatorManifestData,
};
use std::collections::{HashMap, HashSet};

/// Name indexes over the flat CRD and CSV lists of one document.
struct Index<'a> {
    crds: HashMap<&'a str, &'a CustomResourceDefinition>,
    csvs: HashMap<&'a str, &'a ClusterServiceVersion>,
}

impl<'a> Index<'a> {
    fn new(data: &'a StructuredOperatorManifestData) -> Self {
        // On duplicate names the first declaration wins
        let mut crds = HashMap::new();
        for crd in &data.custom_resource_definitions {
            crds.entry(crd.name()).or_insert(crd);
        }
        let mut csvs = HashMap::new();
        for csv in &data.cluster_service_versions {
            csvs.entry(csv.name()).or_insert(csv);
        }
        Self { crds, csvs }
    }
}

/// Decompose a parsed manifest into per-package bundles, in package
/// declaration order.
///
/// # Errors
///
/// Missing channel head, broken or cyclic `replaces` chain, or a missing
/// owned/required CRD. The whole decomposition fails on the first error.
pub fn decompose(
    data: &StructuredOperatorManifestData,
) -> Result<Vec<SingleOperatorManifest>, DatastoreError> {
    let index = Index::new(data);
    data.packages
        .iter()
        .map(|package| decompose_package(package, &index))
        .collect()
}

fn decompose_package(
    package: &PackageManifest,
    index: &Index<'_>,
) -> Result<SingleOperatorManifest, DatastoreError> {
    let mut csvs: Vec<&ClusterServiceVersion> = Vec::new();
    let mut seen_csvs = HashSet::new();
    for channel in &package.channels {
        for csv in walk_channel(package, channel, index)? {
            if seen_csvs.insert(csv.name()) {
                csvs.push(csv);
            }
        }
    }

    let mut crds: Vec<&CustomResourceDefinition> = Vec::new();
    let mut seen_crds = HashSet::new();
    for csv in &csvs {
        let references = csv
            .owned_crds()
            .into_iter()
            .map(|name| ("owned", name))
            .chain(csv.required_crds().into_iter().map(|name| ("required", name)));

        for (relation, name) in references {
            let crd = index
                .crds
                .get(name)
                .copied()
                .ok_or_else(|| DatastoreError::MissingDefinition {
                    package: package.package_name.clone(),
                    csv: csv.name().to_string(),
                    relation,
                    crd: name.to_string(),
                })?;
            if seen_crds.insert(crd.name()) {
                crds.push(crd);
            }
        }
    }

    Ok(SingleOperatorManifest {
        package: package.clone(),
        cluster_service_versions: csvs.into_iter().cloned().collect(),
        custom_resource_definitions: crds.into_iter().cloned().collect(),
    })
}

/// Channel head followed by every CSV it transitively replaces.
fn walk_channel<'a>(
    package: &PackageManifest,
    channel: &PackageChannel,
    index: &Index<'a>,
) -> Result<Vec<&'a ClusterServiceVersion>, DatastoreError> {
    let head = index
        .csvs
        .get(channel.current_csv_name.as_str())
        .copied()
        .ok_or_else(|| DatastoreError::MissingVersionedObject {
            package: package.package_name.clone(),
            channel: channel.name.clone(),
            csv: channel.current_csv_name.clone(),
        })?;

    let mut chain = vec![head];
    let mut visited = HashSet::from([head.name()]);
    let mut current = head;

    while let Some(replaces) = current.replaces() {
        let older = index.csvs.get(replaces).copied().ok_or_else(|| {
            DatastoreError::BrokenReplacesChain {
                package: package.package_name.clone(),
                channel: channel.name.clone(),
                csv: current.name().to_string(),
                replaces: replaces.to_string(),
            }
        })?;

        if !visited.insert(older.name()) {
            return Err(DatastoreError::ReplacesCycle {
                package: package.package_name.clone(),
                channel: channel.name.clone(),
                csv: older.name().to_string(),
            });
        }

        chain.push(older);
        current = older;
    }

    Ok(chain)
}
