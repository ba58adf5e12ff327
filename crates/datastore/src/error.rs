//! Datastore errors

use thiserror::Error;

/// Errors raised while decoding, decomposing or looking up manifests.
#[derive(Debug, Error)]
pub enum DatastoreError {
    /// A blob or one of its sections could not be parsed
    #[error("error parsing '{section}' in operator manifest: {source}")]
    Decode {
        /// Section being parsed (`blob` for the outer document)
        section: &'static str,
        /// Parser error
        source: serde_yaml::Error,
    },

    /// A section could not be serialized
    #[error("error marshaling '{section}' in operator manifest: {source}")]
    Encode {
        /// Section being serialized
        section: &'static str,
        /// Serializer error
        source: serde_yaml::Error,
    },

    /// A channel points at a CSV that is not in the blob
    #[error("package [{package}] channel [{channel}]: did not find CSV [{csv}]")]
    MissingVersionedObject {
        /// Package name
        package: String,
        /// Channel name
        channel: String,
        /// Missing CSV name
        csv: String,
    },

    /// A `replaces` link points at a CSV that is not in the blob
    #[error("package [{package}] channel [{channel}]: CSV [{csv}] replaces unknown CSV [{replaces}]")]
    BrokenReplacesChain {
        /// Package name
        package: String,
        /// Channel name
        channel: String,
        /// CSV holding the broken link
        csv: String,
        /// Missing target
        replaces: String,
    },

    /// Following `replaces` links revisited a CSV
    #[error("package [{package}] channel [{channel}]: replaces chain loops back to CSV [{csv}]")]
    ReplacesCycle {
        /// Package name
        package: String,
        /// Channel name
        channel: String,
        /// CSV visited twice
        csv: String,
    },

    /// A CSV references a CRD that is not in the blob
    #[error("package [{package}]: CSV [{csv}] references unknown {relation} CRD [{crd}]")]
    MissingDefinition {
        /// Package name
        package: String,
        /// Referencing CSV
        csv: String,
        /// `owned` or `required`
        relation: &'static str,
        /// Missing CRD name
        crd: String,
    },

    /// Two blobs of one source define the same package
    #[error("package [{0}] is defined more than once in the same operator source")]
    ConflictingPackage(String),

    /// Requested package is not in the store
    #[error("package [{0}] not found")]
    PackageNotFound(String),

    /// Requested package ID was listed more than once
    #[error("package [{0}] has been specified more than once")]
    DuplicatePackage(String),

    /// No row exists for the operator source
    #[error("operator source [{0}] not found in datastore")]
    SourceNotFound(String),

    /// The operator source object has no UID yet
    #[error("operator source [{0}] has no uid")]
    MissingUid(String),
}
