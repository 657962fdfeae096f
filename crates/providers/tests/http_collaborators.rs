//! HttpDownloader and HttpReachability against a mock server.

use nightjar_core::download::Downloader;
use nightjar_core::error::ArtifactError;
use nightjar_core::network::Reachability;
use nightjar_providers::{HttpDownloader, HttpReachability};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn downloads_full_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/adapters/calm.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 2048]))
        .mount(&server)
        .await;

    let downloader = HttpDownloader::new(1024 * 1024, TIMEOUT);
    let bytes = downloader
        .download(&format!("{}/adapters/calm.bin", server.uri()))
        .await
        .unwrap();
    assert_eq!(bytes.len(), 2048);
    assert!(bytes.iter().all(|b| *b == 7));
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = HttpDownloader::new(1024, TIMEOUT)
        .download(&format!("{}/missing.bin", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ArtifactError::Http { status: 404, .. }));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
        .mount(&server)
        .await;

    let err = HttpDownloader::new(1024, TIMEOUT)
        .download(&format!("{}/big.bin", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ArtifactError::TooLarge { limit: 1024, .. }));
}

#[tokio::test]
async fn empty_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = HttpDownloader::new(1024, TIMEOUT)
        .download(&format!("{}/empty.bin", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ArtifactError::EmptyPayload { .. }));
}

#[tokio::test]
async fn unreachable_host_is_a_download_error() {
    let err = HttpDownloader::new(1024, Duration::from_millis(500))
        .download("http://127.0.0.1:9/adapter.bin")
        .await
        .unwrap_err();
    assert!(matches!(err, ArtifactError::Download { .. }));
}

#[tokio::test]
async fn any_response_counts_as_reachable() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let probe = HttpReachability::new(server.uri(), TIMEOUT);
    assert!(probe.is_reachable().await);
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let probe = HttpReachability::new("http://127.0.0.1:9", Duration::from_millis(500));
    assert!(!probe.is_reachable().await);
}
