//! App-registry data models

use serde::{Deserialize, Serialize};

/// Identity of one repository release in a registry namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryMetadata {
    /// Registry namespace
    pub namespace: String,
    /// Repository name within the namespace
    pub repository: String,
    /// Release (version) of the repository
    pub release: String,
    /// sha256 digest of the release blob
    pub digest: String,
}

impl RegistryMetadata {
    /// `namespace/repository`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}/{}", self.namespace, self.repository)
    }
}

/// An entry in an upstream package listing.
pub type PackageMetadata = RegistryMetadata;

/// A downloaded manifest blob together with its registry identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorMetadata {
    /// Where the blob came from
    pub metadata: RegistryMetadata,
    /// Raw YAML document extracted from the blob
    pub raw_yaml: Vec<u8>,
}

/// Element of `GET /api/v1/packages`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PackageDescription {
    /// `namespace/repository`
    pub name: String,
    /// Default release
    #[serde(default)]
    pub default: Option<String>,
    /// All published releases
    #[serde(default)]
    pub releases: Vec<String>,
}

/// Response of `GET /api/v1/packages/{ns}/{repo}/{release}/{media_type}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReleaseManifest {
    pub content: ReleaseContent,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReleaseContent {
    pub digest: String,
}
