//! CatalogSourceConfig CRD
//!
//! Created by the marketplace controller for every successfully downloaded
//! OperatorSource. Downstream tooling turns it into an installable catalog.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[kube(
    group = "marketplace.redhat.com",
    version = "v1alpha1",
    kind = "CatalogSourceConfig",
    namespaced,
    shortname = "csc",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Target Namespace","type":"string","jsonPath":".spec.targetNamespace"}"#,
    printcolumn = r#"{"name":"Packages","type":"string","jsonPath":".spec.packages"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSourceConfigSpec {
    /// Namespace the catalog is made available in
    pub target_namespace: String,

    /// Comma separated list of package IDs
    pub packages: String,
}

impl CatalogSourceConfigSpec {
    /// Package IDs listed in `packages`, blanks dropped.
    #[must_use]
    pub fn package_ids(&self) -> Vec<String> {
        self.packages
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}
