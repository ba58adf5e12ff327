//! Builders for the objects created on behalf of an `OperatorSource`.

use crds::{CatalogSourceConfig, CatalogSourceConfigSpec, OperatorSource};
use datastore::RawOperatorManifestData;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;

pub const CONFIG_MAP_CRD_KEY: &str = "customResourceDefinitions";
pub const CONFIG_MAP_CSV_KEY: &str = "clusterServiceVersions";
pub const CONFIG_MAP_PACKAGE_KEY: &str = "packages";

const SOURCE_LABEL: &str = "opsrc-owner-name";
const SOURCE_NAMESPACE_LABEL: &str = "opsrc-owner-namespace";

/// Name of the CatalogSourceConfig (and its ConfigMap) for `opsrc`.
pub fn catalog_source_config_name(opsrc: &OperatorSource) -> String {
    opsrc.name_any()
}

fn owned_metadata(opsrc: &OperatorSource) -> ObjectMeta {
    let namespace = opsrc.namespace().unwrap_or_default();
    let labels = BTreeMap::from([
        (SOURCE_LABEL.to_string(), opsrc.name_any()),
        (SOURCE_NAMESPACE_LABEL.to_string(), namespace.clone()),
    ]);

    ObjectMeta {
        name: Some(catalog_source_config_name(opsrc)),
        namespace: Some(namespace),
        labels: Some(labels),
        owner_references: opsrc.controller_owner_ref(&()).map(|r| vec![r]),
        ..Default::default()
    }
}

pub(crate) fn catalog_source_config(opsrc: &OperatorSource, package_ids: &str) -> CatalogSourceConfig {
    CatalogSourceConfig {
        metadata: owned_metadata(opsrc),
        spec: CatalogSourceConfigSpec {
            target_namespace: opsrc.namespace().unwrap_or_default(),
            packages: package_ids.to_string(),
        },
    }
}

pub(crate) fn config_map(opsrc: &OperatorSource, data: RawOperatorManifestData) -> ConfigMap {
    let data = BTreeMap::from([
        (CONFIG_MAP_CRD_KEY.to_string(), data.custom_resource_definitions),
        (CONFIG_MAP_CSV_KEY.to_string(), data.cluster_service_versions),
        (CONFIG_MAP_PACKAGE_KEY.to_string(), data.packages),
    ]);

    ConfigMap {
        metadata: owned_metadata(opsrc),
        data: Some(data),
        ..Default::default()
    }
}
