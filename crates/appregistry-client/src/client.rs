//! App-registry API client
//!
//! Implements the subset of the CNR API the marketplace needs:
//! `/api/v1/packages`, release lookup and blob download.

use crate::blob::extract_manifest;
use crate::error::AppRegistryError;
use crate::models::{
    OperatorMetadata, PackageDescription, PackageMetadata, RegistryMetadata, ReleaseManifest,
};
use crate::registry_trait::{ClientFactory, RegistryClientTrait};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

/// The only registry type this client speaks.
pub const APP_REGISTRY_TYPE: &str = "appregistry";

/// Media type of operator manifest releases.
const MEDIA_TYPE: &str = "helm";

/// App-registry API client
#[derive(Debug, Clone)]
pub struct AppRegistryClient {
    client: Client,
    base_url: String,
}

impl AppRegistryClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - registry endpoint (e.g., "https://quay.io/cnr")
    ///
    /// # Errors
    ///
    /// `InvalidEndpoint` if `base_url` is not an http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, AppRegistryError> {
        let url = Url::parse(base_url)
            .map_err(|e| AppRegistryError::InvalidEndpoint(format!("{base_url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(AppRegistryError::InvalidEndpoint(base_url.to_string()));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, AppRegistryError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppRegistryError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppRegistryError::Api(format!("{url}: {status} - {body}")));
        }

        Ok(response)
    }

    async fn list_repositories(
        &self,
        namespace: &str,
    ) -> Result<Vec<PackageDescription>, AppRegistryError> {
        let url = format!("{}/api/v1/packages?namespace={}", self.base_url, namespace);
        let text = self.get(&url).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Resolve a listed repository to its default release and digest.
    async fn resolve(
        &self,
        namespace: &str,
        description: &PackageDescription,
    ) -> Result<RegistryMetadata, AppRegistryError> {
        // Listing names are "namespace/repository"
        let repository = description
            .name
            .rsplit_once('/')
            .map_or(description.name.as_str(), |(_, repo)| repo)
            .to_string();

        let release = description
            .default
            .clone()
            .or_else(|| description.releases.last().cloned())
            .ok_or_else(|| {
                AppRegistryError::Api(format!("repository {} has no releases", description.name))
            })?;

        let url = format!(
            "{}/api/v1/packages/{}/{}/{}/{}",
            self.base_url, namespace, repository, release, MEDIA_TYPE
        );
        let text = self.get(&url).await?.text().await?;
        let manifest: ReleaseManifest = serde_json::from_str(&text)?;

        Ok(RegistryMetadata {
            namespace: namespace.to_string(),
            repository,
            release,
            digest: manifest.content.digest,
        })
    }

    /// Download and unpack the blob of one release.
    pub async fn download(&self, metadata: &RegistryMetadata) -> Result<Vec<u8>, AppRegistryError> {
        let url = format!(
            "{}/api/v1/packages/{}/{}/blobs/sha256/{}",
            self.base_url, metadata.namespace, metadata.repository, metadata.digest
        );
        let bytes = self.get(&url).await?.bytes().await?;
        extract_manifest(&bytes)
    }
}

#[async_trait::async_trait]
impl RegistryClientTrait for AppRegistryClient {
    async fn list_packages(&self, namespace: &str) -> Result<Vec<PackageMetadata>, AppRegistryError> {
        let descriptions = self.list_repositories(namespace).await?;
        let mut packages = Vec::with_capacity(descriptions.len());
        for description in &descriptions {
            packages.push(self.resolve(namespace, description).await?);
        }
        debug!("Found {} repositories in namespace {}", packages.len(), namespace);
        Ok(packages)
    }

    async fn retrieve_all(&self, namespace: &str) -> Result<Vec<OperatorMetadata>, AppRegistryError> {
        let packages = self.list_packages(namespace).await?;
        let mut blobs = Vec::with_capacity(packages.len());
        for metadata in packages {
            let raw_yaml = self.download(&metadata).await?;
            blobs.push(OperatorMetadata { metadata, raw_yaml });
        }
        Ok(blobs)
    }
}

/// Creates [`AppRegistryClient`]s for operator sources of type `appregistry`.
#[derive(Debug, Clone, Default)]
pub struct AppRegistryClientFactory;

impl ClientFactory for AppRegistryClientFactory {
    fn new_client(
        &self,
        registry_type: &str,
        endpoint: &str,
    ) -> Result<Box<dyn RegistryClientTrait>, AppRegistryError> {
        if !registry_type.eq_ignore_ascii_case(APP_REGISTRY_TYPE) {
            return Err(AppRegistryError::UnsupportedType(registry_type.to_string()));
        }
        Ok(Box::new(AppRegistryClient::new(endpoint)?))
    }
}
