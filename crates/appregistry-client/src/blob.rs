//! Registry blob extraction
//!
//! A release blob is a gzip'd tarball. The manifest is the first YAML file in
//! the archive.

use crate::error::AppRegistryError;
use flate2::read::GzDecoder;
use std::io::Read;
use tar::Archive;

/// Extract the first `.yaml`/`.yml` file from a gzip'd tarball.
///
/// # Errors
///
/// `InvalidBlob` when the archive cannot be read or holds no YAML file.
pub fn extract_manifest(blob: &[u8]) -> Result<Vec<u8>, AppRegistryError> {
    let mut archive = Archive::new(GzDecoder::new(blob));

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let is_yaml = entry
            .path()?
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if !is_yaml {
            continue;
        }

        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        return Ok(data);
    }

    Err(AppRegistryError::InvalidBlob(
        "archive does not contain a yaml manifest".to_string(),
    ))
}
