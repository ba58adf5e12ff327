//! HTTP tests for the app-registry client against a mock registry server.

use appregistry_client::{AppRegistryClient, AppRegistryError, RegistryClientTrait};
use flate2::Compression;
use flate2::write::GzEncoder;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MANIFEST: &str = "publisher: coreos\ndata:\n  packages: |\n    - packageName: etcd\n";

fn tarball(name: &str, data: &[u8]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, data).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

async fn mount_etcd(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/packages"))
        .and(query_param("namespace", "marketplace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "marketplace/etcd", "default": "0.0.2", "releases": ["0.0.1", "0.0.2"]}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/packages/marketplace/etcd/0.0.2/helm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "package": "marketplace/etcd",
            "release": "0.0.2",
            "content": {"digest": "abc123", "mediaType": "helm", "size": 42}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_list_packages_resolves_digest() {
    let server = MockServer::start().await;
    mount_etcd(&server).await;

    let client = AppRegistryClient::new(&server.uri()).unwrap();
    let packages = client.list_packages("marketplace").await.unwrap();

    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].namespace, "marketplace");
    assert_eq!(packages[0].repository, "etcd");
    assert_eq!(packages[0].release, "0.0.2");
    assert_eq!(packages[0].digest, "abc123");
}

#[tokio::test]
async fn test_retrieve_all_downloads_and_extracts() {
    let server = MockServer::start().await;
    mount_etcd(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/packages/marketplace/etcd/blobs/sha256/abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(tarball("etcd/manifest.yaml", MANIFEST.as_bytes())),
        )
        .mount(&server)
        .await;

    let client = AppRegistryClient::new(&server.uri()).unwrap();
    let blobs = client.retrieve_all("marketplace").await.unwrap();

    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].metadata.repository, "etcd");
    assert_eq!(blobs[0].raw_yaml, MANIFEST.as_bytes());
}

#[tokio::test]
async fn test_empty_namespace() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = AppRegistryClient::new(&server.uri()).unwrap();
    assert!(client.retrieve_all("nothing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_not_found_and_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages"))
        .and(query_param("namespace", "missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages"))
        .and(query_param("namespace", "broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = AppRegistryClient::new(&server.uri()).unwrap();

    let err = client.list_packages("missing").await.unwrap_err();
    assert!(matches!(err, AppRegistryError::NotFound(_)));

    let err = client.list_packages("broken").await.unwrap_err();
    match err {
        AppRegistryError::Api(message) => assert!(message.contains("boom")),
        other => panic!("unexpected error: {other}"),
    }
}
