//! Reconciliation phases
//!
//! The lifecycle an `OperatorSource` goes through while being reconciled:
//!
//! `Initial --> Validating --> Downloading --> Configuring --> Succeeded`
//!
//! Reconciliation errors move the object into `Failed`. A spec change, a lost
//! cache or an upstream registry update moves it into `Purging`, which cleans
//! up and re-enters `Validating`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a reconciliation phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, Default)]
pub enum PhaseName {
    /// Newly observed object, or one whose status was dropped
    #[default]
    #[serde(rename = "")]
    Initial,

    /// Spec is being validated
    Validating,

    /// Manifests are being downloaded from the registry into the datastore
    Downloading,

    /// The dependent CatalogSourceConfig is being created
    Configuring,

    /// Reconciliation completed
    Succeeded,

    /// Reconciliation failed, retried later
    Failed,

    /// Cached manifests and dependent resources are being removed
    Purging,
}

impl PhaseName {
    /// All phases in lifecycle order.
    pub const ALL: [PhaseName; 7] = [
        PhaseName::Initial,
        PhaseName::Validating,
        PhaseName::Downloading,
        PhaseName::Configuring,
        PhaseName::Succeeded,
        PhaseName::Failed,
        PhaseName::Purging,
    ];

    /// Wire representation of the phase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseName::Initial => "",
            PhaseName::Validating => "Validating",
            PhaseName::Downloading => "Downloading",
            PhaseName::Configuring => "Configuring",
            PhaseName::Succeeded => "Succeeded",
            PhaseName::Failed => "Failed",
            PhaseName::Purging => "Purging",
        }
    }

    /// Default human readable message recorded alongside the phase.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            PhaseName::Initial => "",
            PhaseName::Validating => "Scheduled for validation",
            PhaseName::Downloading => "Scheduled for download of operator manifest(s)",
            PhaseName::Configuring => "Scheduled for configuration",
            PhaseName::Succeeded => "The object has been successfully reconciled",
            PhaseName::Failed => "Reconciliation has failed",
            PhaseName::Purging => "Scheduled for purging",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseName::Initial => f.write_str("Initial"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A phase together with its message.
///
/// Phase reconcilers return one of these to request a transition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    /// Phase name
    #[serde(default)]
    pub name: PhaseName,

    /// Human readable message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Phase {
    /// Phase with its default message.
    #[must_use]
    pub fn new(name: PhaseName) -> Self {
        Self {
            name,
            message: name.default_message().to_string(),
        }
    }

    /// Phase with a custom message (typically an error).
    #[must_use]
    pub fn with_message(name: PhaseName, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }
}

/// Phase as recorded in an object's status.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPhase {
    /// Current phase and its message
    #[serde(default)]
    pub phase: Phase,

    /// Last time the phase name changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,

    /// Last time the phase name or message changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,
}
