//! Operator manifest model
//!
//! A registry blob is a YAML document with three sections, each itself a YAML
//! string holding a list: CRDs, CSVs and packages. CRDs and CSVs are kept as
//! loosely typed Kubernetes objects so that fields this controller doesn't
//! care about pass through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outer document of a registry blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperatorManifest {
    /// Publisher of the operators in this blob
    #[serde(default)]
    pub publisher: String,

    /// The three manifest sections
    #[serde(default)]
    pub data: RawOperatorManifestData,
}

/// The three manifest sections, each a serialized YAML list.
///
/// This is also what a read hands back, ready to be placed into a ConfigMap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawOperatorManifestData {
    /// Serialized list of CustomResourceDefinitions
    #[serde(default)]
    pub custom_resource_definitions: String,

    /// Serialized list of ClusterServiceVersions
    #[serde(default)]
    pub cluster_service_versions: String,

    /// Serialized list of PackageManifests
    #[serde(default)]
    pub packages: String,
}

/// Parsed form of [`RawOperatorManifestData`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StructuredOperatorManifestData {
    /// All CRDs in the document
    pub custom_resource_definitions: Vec<CustomResourceDefinition>,
    /// All CSVs in the document
    pub cluster_service_versions: Vec<ClusterServiceVersion>,
    /// All packages in the document
    pub packages: Vec<PackageManifest>,
}

/// Metadata of a [`KubeObject`]. Only the name is interpreted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ObjectMetadata {
    /// Object name
    #[serde(default)]
    pub name: String,

    /// Everything else (namespace, annotations, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A Kubernetes object whose spec is kept opaque.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct KubeObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(default)]
    pub metadata: ObjectMetadata,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub spec: Value,
}

impl KubeObject {
    /// Object name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// A CRD as found in a manifest blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct CustomResourceDefinition(pub KubeObject);

impl CustomResourceDefinition {
    /// CRD name, e.g. `etcdclusters.etcd.database.coreos.com`
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }
}

/// A CSV as found in a manifest blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct ClusterServiceVersion(pub KubeObject);

impl ClusterServiceVersion {
    /// CSV name, e.g. `etcdoperator.v0.9.2`
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Name of the CSV this one upgrades from, if any.
    #[must_use]
    pub fn replaces(&self) -> Option<&str> {
        self.0
            .spec
            .get("replaces")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Names of the CRDs this CSV owns.
    #[must_use]
    pub fn owned_crds(&self) -> Vec<&str> {
        self.crd_references("owned")
    }

    /// Names of the CRDs this CSV requires.
    #[must_use]
    pub fn required_crds(&self) -> Vec<&str> {
        self.crd_references("required")
    }

    fn crd_references(&self, relation: &str) -> Vec<&str> {
        self.0
            .spec
            .get("customresourcedefinitions")
            .and_then(|crds| crds.get(relation))
            .and_then(Value::as_array)
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| r.get("name").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A package and its channels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Package name, e.g. `etcd`. Doubles as the package ID.
    pub package_name: String,

    /// Declared channels, e.g. `alpha`, `stable`
    #[serde(default)]
    pub channels: Vec<PackageChannel>,

    /// Channel installed when none is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_channel: Option<String>,
}

/// A channel pointing at the CSV currently published on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PackageChannel {
    /// Channel name
    pub name: String,

    /// Head of the channel
    #[serde(rename = "currentCSV")]
    pub current_csv_name: String,
}

/// Everything needed to install one package: the package itself, every CSV
/// reachable from its channels and every CRD those CSVs reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SingleOperatorManifest {
    pub package: PackageManifest,
    pub cluster_service_versions: Vec<ClusterServiceVersion>,
    pub custom_resource_definitions: Vec<CustomResourceDefinition>,
}

impl SingleOperatorManifest {
    /// Package ID used as the store key.
    #[must_use]
    pub fn package_id(&self) -> &str {
        &self.package.package_name
    }
}
