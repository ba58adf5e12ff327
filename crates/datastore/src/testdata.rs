//! Fixtures shared by the datastore tests.

use crate::codec;
use crate::manifest::{
    ClusterServiceVersion, CustomResourceDefinition, KubeObject, ObjectMetadata, OperatorManifest,
    PackageChannel, PackageManifest, StructuredOperatorManifestData,
};
use serde_json::json;

/// etcd operator: one channel, three CSVs in a straight replaces chain.
pub const ETCD_BLOB: &str = include_str!("testdata/etcd.yaml");

pub fn crd(name: &str) -> CustomResourceDefinition {
    CustomResourceDefinition(KubeObject {
        api_version: "apiextensions.k8s.io/v1beta1".to_string(),
        kind: "CustomResourceDefinition".to_string(),
        metadata: ObjectMetadata {
            name: name.to_string(),
            ..Default::default()
        },
        spec: json!({"group": "example.com", "version": "v1"}),
    })
}

pub fn csv(
    name: &str,
    replaces: Option<&str>,
    owned: &[&str],
    required: &[&str],
) -> ClusterServiceVersion {
    let reference = |n: &&str| json!({"name": n, "version": "v1", "kind": "Kind"});
    let mut spec = json!({
        "displayName": name,
        "customresourcedefinitions": {
            "owned": owned.iter().map(reference).collect::<Vec<_>>(),
            "required": required.iter().map(reference).collect::<Vec<_>>(),
        },
    });
    if let Some(replaces) = replaces {
        spec["replaces"] = json!(replaces);
    }

    ClusterServiceVersion(KubeObject {
        api_version: "operators.coreos.com/v1alpha1".to_string(),
        kind: "ClusterServiceVersion".to_string(),
        metadata: ObjectMetadata {
            name: name.to_string(),
            ..Default::default()
        },
        spec,
    })
}

/// Package with `(channel, currentCSV)` pairs; the first channel is default.
pub fn package(name: &str, channels: &[(&str, &str)]) -> PackageManifest {
    PackageManifest {
        package_name: name.to_string(),
        channels: channels
            .iter()
            .map(|(channel, head)| PackageChannel {
                name: (*channel).to_string(),
                current_csv_name: (*head).to_string(),
            })
            .collect(),
        default_channel: channels.first().map(|(channel, _)| (*channel).to_string()),
    }
}

/// Serialize structured data as a complete registry blob.
pub fn blob(data: &StructuredOperatorManifestData) -> Vec<u8> {
    let manifest = OperatorManifest {
        publisher: "test".to_string(),
        data: codec::marshal(data).unwrap(),
    };
    serde_yaml::to_string(&manifest).unwrap().into_bytes()
}

/// Two packages, `prometheus` and `amq`, whose CSVs share a CRD.
pub fn two_package_data() -> StructuredOperatorManifestData {
    StructuredOperatorManifestData {
        custom_resource_definitions: vec![
            crd("prometheuses.monitoring.coreos.com"),
            crd("alertmanagers.monitoring.coreos.com"),
            crd("shared.example.com"),
            crd("addresses.amq.io"),
        ],
        cluster_service_versions: vec![
            csv(
                "prometheusoperator.0.22.2",
                Some("prometheusoperator.0.15.0"),
                &["prometheuses.monitoring.coreos.com", "alertmanagers.monitoring.coreos.com"],
                &["shared.example.com"],
            ),
            csv(
                "prometheusoperator.0.15.0",
                None,
                &["prometheuses.monitoring.coreos.com"],
                &[],
            ),
            csv("amq-streams.1.0.0", None, &["addresses.amq.io"], &["shared.example.com"]),
        ],
        packages: vec![
            package("prometheus", &[("preview", "prometheusoperator.0.22.2")]),
            package("amq-streams", &[("final", "amq-streams.1.0.0")]),
        ],
    }
}
