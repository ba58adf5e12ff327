//! App-registry client errors

use thiserror::Error;

/// Errors that can occur when talking to an app-registry
#[derive(Debug, Error)]
pub enum AppRegistryError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Registry returned a non-success status
    #[error("App-registry API error: {0}")]
    Api(String),

    /// JSON deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Repository, release or blob not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Blob could not be unpacked
    #[error("Invalid blob: {0}")]
    InvalidBlob(String),

    /// Registry type is not supported
    #[error("Unsupported registry type: {0}")]
    UnsupportedType(String),

    /// Endpoint is not a usable URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<std::io::Error> for AppRegistryError {
    fn from(err: std::io::Error) -> Self {
        AppRegistryError::InvalidBlob(err.to_string())
    }
}
