use super::*;
use crate::reference::Container;
use mockito::Server;
use std::time::Duration;
use tempfile::tempdir;

fn cache() -> Cache {
    let dir = tempdir().unwrap();
    Cache::new(dir.path().to_path_buf()).unwrap()
}

#[tokio::test]
async fn test_get_manifest_fetches_and_caches() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/konflux-ci/foo/manifests/sha256:aaaa")
        .with_status(200)
        .with_body(r#"{"schemaVersion":2,"layers":[]}"#)
        .create_async()
        .await;

    let client = RegistryClient::with_scheme(cache(), Duration::from_secs(5), "http").unwrap();
    let container = Container::parse(&format!(
        "{}/konflux-ci/foo@sha256:aaaa",
        server.host_with_port()
    ))
    .unwrap();

    let manifest = client.get_manifest(&container).await.unwrap();
    assert_eq!(manifest["schemaVersion"], 2);

    // Second call should be served from cache, not hit the mock again.
    let manifest2 = client.get_manifest(&container).await.unwrap();
    assert_eq!(manifest2["schemaVersion"], 2);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_manifest_requires_digest() {
    let client = RegistryClient::with_scheme(cache(), Duration::from_secs(5), "http").unwrap();
    let container = Container::parse("quay.io/konflux-ci/foo:0.1-abcd").unwrap();
    let result = client.get_manifest(&container).await;
    assert!(matches!(result, Err(MigrateError::BadReference { .. })));
}

#[tokio::test]
async fn test_get_manifest_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/konflux-ci/foo/manifests/sha256:bbbb")
        .with_status(404)
        .create_async()
        .await;

    let client = RegistryClient::with_scheme(cache(), Duration::from_secs(5), "http").unwrap();
    let container = Container::parse(&format!(
        "{}/konflux-ci/foo@sha256:bbbb",
        server.host_with_port()
    ))
    .unwrap();

    let result = client.get_manifest(&container).await;
    assert!(matches!(
        result,
        Err(MigrateError::RegistryError {
            status_code: Some(404),
            ..
        })
    ));
}

#[tokio::test]
async fn test_get_artifact_fetches_and_caches() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/konflux-ci/foo/blobs/sha256:cccc")
        .with_status(200)
        .with_body("#!/bin/sh\necho migrating\n")
        .create_async()
        .await;

    let client = RegistryClient::with_scheme(cache(), Duration::from_secs(5), "http").unwrap();
    let container = Container::parse(&format!(
        "{}/konflux-ci/foo@sha256:cccc",
        server.host_with_port()
    ))
    .unwrap();

    let content = client.get_artifact(&container, "sha256:cccc").await.unwrap();
    assert!(content.contains("echo migrating"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_referrers_filters_by_artifact_type() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/konflux-ci/foo/referrers/sha256:dddd")
        .match_query(mockito::Matcher::UrlEncoded(
            "artifactType".into(),
            "text/x-shellscript".into(),
        ))
        .with_status(200)
        .with_body(r#"{"schemaVersion":2,"manifests":[]}"#)
        .create_async()
        .await;

    let client = RegistryClient::with_scheme(cache(), Duration::from_secs(5), "http").unwrap();
    let container = Container::parse(&format!(
        "{}/konflux-ci/foo@sha256:dddd",
        server.host_with_port()
    ))
    .unwrap();

    let index = client
        .list_referrers(&container, Some("text/x-shellscript"))
        .await
        .unwrap();
    assert_eq!(index["schemaVersion"], 2);
    mock.assert_async().await;
}
