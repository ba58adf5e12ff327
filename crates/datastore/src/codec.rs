//! Blob decoding and encoding
//!
//! `unmarshal` turns raw blob bytes into the outer document,
//! `unmarshal_data` parses the three sections and `marshal` serializes them
//! back.

use crate::error::DatastoreError;
use crate::manifest::{OperatorManifest, RawOperatorManifestData, StructuredOperatorManifestData};
use serde::Serialize;
use serde::de::DeserializeOwned;

const CRD_SECTION: &str = "customResourceDefinitions";
const CSV_SECTION: &str = "clusterServiceVersions";
const PACKAGE_SECTION: &str = "packages";

/// Parse raw blob bytes.
///
/// # Errors
///
/// `Decode` if the bytes are not a YAML manifest document.
pub fn unmarshal(blob: &[u8]) -> Result<OperatorManifest, DatastoreError> {
    serde_yaml::from_slice(blob).map_err(|source| DatastoreError::Decode {
        section: "blob",
        source,
    })
}

/// Parse the three sections into structured lists.
///
/// # Errors
///
/// `Decode` naming the first section that fails to parse.
pub fn unmarshal_data(
    data: &RawOperatorManifestData,
) -> Result<StructuredOperatorManifestData, DatastoreError> {
    Ok(StructuredOperatorManifestData {
        custom_resource_definitions: parse_section(CRD_SECTION, &data.custom_resource_definitions)?,
        cluster_service_versions: parse_section(CSV_SECTION, &data.cluster_service_versions)?,
        packages: parse_section(PACKAGE_SECTION, &data.packages)?,
    })
}

/// Serialize structured lists back into the three sections.
///
/// # Errors
///
/// `Encode` naming the section that failed.
pub fn marshal(
    data: &StructuredOperatorManifestData,
) -> Result<RawOperatorManifestData, DatastoreError> {
    Ok(RawOperatorManifestData {
        custom_resource_definitions: to_section(CRD_SECTION, &data.custom_resource_definitions)?,
        cluster_service_versions: to_section(CSV_SECTION, &data.cluster_service_versions)?,
        packages: to_section(PACKAGE_SECTION, &data.packages)?,
    })
}

fn parse_section<T: DeserializeOwned>(
    section: &'static str,
    raw: &str,
) -> Result<Vec<T>, DatastoreError> {
    // An absent section is an empty list
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(raw).map_err(|source| DatastoreError::Decode { section, source })
}

fn to_section<T: Serialize>(section: &'static str, items: &[T]) -> Result<String, DatastoreError> {
    serde_yaml::to_string(items).map_err(|source| DatastoreError::Encode { section, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::ETCD_BLOB;

    #[test]
    fn test_unmarshal_etcd_blob() {
        let manifest = unmarshal(ETCD_BLOB.as_bytes()).unwrap();
        assert_eq!(manifest.publisher, "coreos");

        let data = unmarshal_data(&manifest.data).unwrap();
        assert_eq!(data.custom_resource_definitions.len(), 3);
        assert_eq!(data.cluster_service_versions.len(), 3);
        assert_eq!(data.packages.len(), 1);
        assert_eq!(data.packages[0].package_name, "etcd");
        assert_eq!(data.packages[0].channels[0].current_csv_name, "etcdoperator.v0.9.2");
    }

    #[test]
    fn test_csv_accessors() {
        let manifest = unmarshal(ETCD_BLOB.as_bytes()).unwrap();
        let data = unmarshal_data(&manifest.data).unwrap();

        let head = data
            .cluster_service_versions
            .iter()
            .find(|csv| csv.name() == "etcdoperator.v0.9.2")
            .unwrap();
        assert_eq!(head.replaces(), Some("etcdoperator.v0.9.0"));
        assert_eq!(head.owned_crds().len(), 3);
        assert!(head.required_crds().is_empty());

        let oldest = data
            .cluster_service_versions
            .iter()
            .find(|csv| csv.name() == "etcdoperator.v0.6.1")
            .unwrap();
        assert_eq!(oldest.replaces(), None);
    }

    #[test]
    fn test_empty_sections_parse_as_empty_lists() {
        let data = unmarshal_data(&RawOperatorManifestData::default()).unwrap();
        assert!(data.packages.is_empty());
        assert!(data.cluster_service_versions.is_empty());
    }

    #[test]
    fn test_bad_section_is_named() {
        let raw = RawOperatorManifestData {
            packages: "packageName: [unterminated".to_string(),
            ..Default::default()
        };
        match unmarshal_data(&raw).unwrap_err() {
            DatastoreError::Decode { section, .. } => assert_eq!(section, "packages"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_marshal_then_unmarshal_preserves_content() {
        let manifest = unmarshal(ETCD_BLOB.as_bytes()).unwrap();
        let data = unmarshal_data(&manifest.data).unwrap();

        let raw = marshal(&data).unwrap();
        let reparsed = unmarshal_data(&raw).unwrap();
        assert_eq!(reparsed, data);
    }
}
