//! OperatorSource CRD
//!
//! Points the marketplace at a remote registry namespace holding operator
//! manifests.

use crate::phase::{ObjectPhase, PhaseName};
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[kube(
    group = "marketplace.redhat.com",
    version = "v1alpha1",
    kind = "OperatorSource",
    namespaced,
    shortname = "opsrc",
    status = "OperatorSourceStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.type"}"#,
    printcolumn = r#"{"name":"Endpoint","type":"string","jsonPath":".spec.endpoint"}"#,
    printcolumn = r#"{"name":"Registry","type":"string","jsonPath":".spec.registryNamespace"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.currentPhase.phase.name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSourceSpec {
    /// Registry type (e.g. "appregistry")
    #[serde(rename = "type")]
    pub source_type: String,

    /// Registry endpoint URL
    pub endpoint: String,

    /// Namespace within the registry that holds the operator repositories
    pub registry_namespace: String,

    /// Display name (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Publisher (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl OperatorSourceSpec {
    /// Case-insensitive comparison of the fields that determine what gets
    /// downloaded. Informational fields are ignored.
    #[must_use]
    pub fn is_equal(&self, other: &OperatorSourceSpec) -> bool {
        self.source_type.eq_ignore_ascii_case(&other.source_type)
            && self.endpoint.eq_ignore_ascii_case(&other.endpoint)
            && self.registry_namespace.eq_ignore_ascii_case(&other.registry_namespace)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSourceStatus {
    /// Current reconciliation phase
    #[serde(default)]
    pub current_phase: ObjectPhase,
}

impl OperatorSource {
    /// Phase recorded in status, `Initial` when there is no status.
    #[must_use]
    pub fn current_phase_name(&self) -> PhaseName {
        self.status
            .as_ref()
            .map(|s| s.current_phase.phase.name)
            .unwrap_or_default()
    }

    /// `namespace/name` for logging.
    #[must_use]
    pub fn namespaced_name(&self) -> String {
        format!(
            "{}/{}",
            self.namespace().unwrap_or_else(|| "default".to_string()),
            self.name_any()
        )
    }
}
