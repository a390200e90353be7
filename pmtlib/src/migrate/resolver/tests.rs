use super::*;
use crate::cache::Cache;
use mockito::Server;
use std::time::Duration;
use tempfile::tempdir;

fn registry(scheme: &str) -> RegistryClient {
    let dir = tempdir().unwrap();
    let cache = Cache::new(dir.path().to_path_buf()).unwrap();
    RegistryClient::with_scheme(cache, Duration::from_secs(5), scheme).unwrap()
}

fn tag(name: &str, digest: &str, start_ts: i64) -> QuayTagInfo {
    QuayTagInfo {
        name: name.to_string(),
        manifest_digest: digest.to_string(),
        start_ts,
    }
}

#[tokio::test]
async fn test_simple_iteration_skips_tags_without_migration_annotation() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/konflux-ci/foo/manifests/sha256:aaaa")
        .with_status(200)
        .with_body(r#"{"schemaVersion":2,"annotations":{"dev.konflux-ci.task.has-migration":"false"}}"#)
        .create_async()
        .await;

    let registry = registry("http");
    let dep_name = format!("{}/konflux-ci/foo", server.host_with_port());
    let tags = vec![tag("0.2-aaaa", "sha256:aaaa", 100)];

    let migrations = resolve_simple_iteration(&registry, &dep_name, &tags).await.unwrap();
    assert!(migrations.is_empty());
}

#[tokio::test]
async fn test_simple_iteration_fetches_migration_when_annotated() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/konflux-ci/foo/manifests/sha256:bbbb")
        .with_status(200)
        .with_body(r#"{"schemaVersion":2,"annotations":{"dev.konflux-ci.task.has-migration":"true"}}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/konflux-ci/foo/referrers/sha256:bbbb")
        .with_status(200)
        .with_body(
            r#"{"schemaVersion":2,"manifests":[
                {"digest":"sha256:migmanifest","annotations":{"dev.konflux-ci.task.is-migration":"true"}}
            ]}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/v2/konflux-ci/foo/manifests/sha256:migmanifest")
        .with_status(200)
        .with_body(r#"{"schemaVersion":2,"layers":[{"digest":"sha256:scriptlayer"}]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/konflux-ci/foo/blobs/sha256:scriptlayer")
        .with_status(200)
        .with_body("#!/bin/sh\necho migrating\n")
        .create_async()
        .await;

    let registry = registry("http");
    let dep_name = format!("{}/konflux-ci/foo", server.host_with_port());
    let tags = vec![tag("0.2-bbbb", "sha256:bbbb", 100)];

    let migrations = resolve_simple_iteration(&registry, &dep_name, &tags).await.unwrap();
    assert_eq!(migrations.len(), 1);
    assert_eq!(migrations[0].migration_script, "#!/bin/sh\necho migrating\n");
    assert!(migrations[0].task_bundle.contains("0.2-bbbb@sha256:bbbb"));
}

#[tokio::test]
async fn test_linked_resolver_returns_empty_for_empty_range() {
    let registry = registry("http");
    let migrations = resolve_linked(&registry, "quay.io/konflux-ci/foo", &[]).await.unwrap();
    assert!(migrations.is_empty());
}

#[tokio::test]
async fn test_linked_resolver_follows_previous_migration_chain() {
    let mut server = Server::new_async().await;
    // Newest tag: has a migration and points back at the oldest tag's digest.
    server
        .mock("GET", "/v2/konflux-ci/foo/manifests/sha256:new")
        .with_status(200)
        .with_body(
            r#"{"schemaVersion":2,"annotations":{
                "dev.konflux-ci.task.has-migration":"true",
                "dev.konflux-ci.task.previous-migration-bundle":"sha256:old"
            }}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/v2/konflux-ci/foo/referrers/sha256:new")
        .with_status(200)
        .with_body(
            r#"{"schemaVersion":2,"manifests":[
                {"digest":"sha256:newmig","annotations":{"dev.konflux-ci.task.is-migration":"true"}}
            ]}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/v2/konflux-ci/foo/manifests/sha256:newmig")
        .with_status(200)
        .with_body(r#"{"schemaVersion":2,"layers":[{"digest":"sha256:newscript"}]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/konflux-ci/foo/blobs/sha256:newscript")
        .with_status(200)
        .with_body("echo new\n")
        .create_async()
        .await;

    // Oldest tag: no migration, and no further previous link, so the walk stops.
    server
        .mock("GET", "/v2/konflux-ci/foo/manifests/sha256:old")
        .with_status(200)
        .with_body(r#"{"schemaVersion":2,"annotations":{"dev.konflux-ci.task.has-migration":"false"}}"#)
        .create_async()
        .await;

    let registry = registry("http");
    let dep_name = format!("{}/konflux-ci/foo", server.host_with_port());
    // Middle tag is never visited: the chain jumps straight from "new" to "old".
    let tags = vec![
        tag("0.3-new", "sha256:new", 300),
        tag("0.2-mid", "sha256:mid", 200),
        tag("0.1-old", "sha256:old", 100),
    ];

    let migrations = resolve_linked(&registry, &dep_name, &tags).await.unwrap();
    assert_eq!(migrations.len(), 1);
    assert_eq!(migrations[0].migration_script, "echo new\n");
}

#[tokio::test]
async fn test_resolve_reverses_migrations_into_oldest_first_order() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/repository/konflux-ci/foo/tag/")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"has_additional": false, "tags": [
                {"name": "0.2-bbbb", "manifest_digest": "sha256:bbbb", "start_ts": 200},
                {"name": "0.1-aaaa", "manifest_digest": "sha256:aaaa", "start_ts": 100}
            ]}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/v2/konflux-ci/foo/manifests/sha256:bbbb")
        .with_status(200)
        .with_body(r#"{"schemaVersion":2,"annotations":{"dev.konflux-ci.task.has-migration":"false"}}"#)
        .create_async()
        .await;

    let reg = registry("http");
    let http = reqwest::Client::new();
    let dep_name = format!("{}/konflux-ci/foo", server.host_with_port());
    let mut upgrades = vec![TaskBundleUpgrade {
        dep_name,
        current_value: "0.1".to_string(),
        current_digest: "sha256:aaaa".to_string(),
        new_value: "0.2".to_string(),
        new_digest: "sha256:bbbb".to_string(),
        migrations: Vec::new(),
    }];

    resolve(&reg, &http, "http", ResolverStrategy::SimpleIteration, &mut upgrades)
        .await
        .unwrap();

    assert!(upgrades[0].migrations.is_empty());
}
