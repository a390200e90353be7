use super::*;
use std::env;
use std::sync::Mutex;

// PMT_LOCAL_TEST is process-global state; serialize tests that touch it.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn sample_upgrade(dep_name: &str, dep_types: &str) -> String {
    format!(
        r#"{{
            "depName": "{dep_name}",
            "currentValue": "0.1",
            "currentDigest": "sha256:aaaa",
            "newValue": "0.2",
            "newDigest": "sha256:bbbb",
            "depTypes": [{dep_types}],
            "packageFile": "pipeline.yaml",
            "parentDir": "tasks"
        }}"#
    )
}

#[test]
fn test_clean_upgrades_rejects_invalid_json() {
    let result = clean_upgrades("not json");
    assert!(matches!(result, Err(MigrateError::InvalidUpgradesData { .. })));
}

#[test]
fn test_clean_upgrades_rejects_non_array() {
    let result = clean_upgrades(r#"{"not": "a list"}"#);
    assert!(matches!(result, Err(MigrateError::InvalidUpgradesData { .. })));
}

#[test]
fn test_clean_upgrades_skips_falsy_entries() {
    let input = format!("[null, false, {{}}, {}]", sample_upgrade("quay.io/konflux-ci/foo", "\"tekton-bundle\""));
    let cleaned = clean_upgrades(&input).unwrap();
    assert_eq!(cleaned.len(), 1);
}

#[test]
fn test_clean_upgrades_filters_untrusted_org() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::remove_var("PMT_LOCAL_TEST");

    let input = format!("[{}]", sample_upgrade("quay.io/someone-else/foo", "\"tekton-bundle\""));
    let cleaned = clean_upgrades(&input).unwrap();
    assert!(cleaned.is_empty());
}

#[test]
fn test_clean_upgrades_local_test_override_admits_untrusted_org() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("PMT_LOCAL_TEST", "1");

    let input = format!("[{}]", sample_upgrade("example.com/someone-else/foo", "\"tekton-bundle\""));
    let cleaned = clean_upgrades(&input).unwrap();
    assert_eq!(cleaned.len(), 1);

    env::remove_var("PMT_LOCAL_TEST");
}

#[test]
fn test_clean_upgrades_filters_non_tekton_bundle_dep_type() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::remove_var("PMT_LOCAL_TEST");

    let input = format!("[{}]", sample_upgrade("quay.io/konflux-ci/foo", "\"npm\""));
    let cleaned = clean_upgrades(&input).unwrap();
    assert!(cleaned.is_empty());
}

#[test]
fn test_clean_upgrades_rejects_missing_dep_name() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::remove_var("PMT_LOCAL_TEST");

    let input = r#"[{"currentValue": "0.1"}]"#;
    let result = clean_upgrades(input);
    assert!(matches!(result, Err(MigrateError::InvalidUpgradesData { .. })));
}

#[test]
fn test_clean_upgrades_rejects_malformed_digest() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::remove_var("PMT_LOCAL_TEST");

    let input = r#"[{
        "depName": "quay.io/konflux-ci/foo",
        "currentValue": "0.1",
        "currentDigest": "not-a-digest",
        "newValue": "0.2",
        "newDigest": "sha256:bbbb",
        "depTypes": ["tekton-bundle"],
        "packageFile": "pipeline.yaml",
        "parentDir": "tasks"
    }]"#;
    let result = clean_upgrades(input);
    assert!(matches!(result, Err(MigrateError::InvalidUpgradesData { .. })));
}

#[test]
fn test_comes_from_konflux_checks_trusted_prefix() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::remove_var("PMT_LOCAL_TEST");

    assert!(comes_from_konflux("quay.io/konflux-ci/foo"));
    assert!(!comes_from_konflux("quay.io/someone-else/foo"));
}
