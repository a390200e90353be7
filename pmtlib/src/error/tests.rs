use super::*;
use std::error::Error;

#[test]
fn test_network_error_connection_refused() {
    let err = MigrateError::Network {
        message: "connection refused".to_string(),
        source: None,
    };

    assert!(matches!(err, MigrateError::Network { .. }));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_invalid_upgrades_data_error() {
    let err = MigrateError::InvalidUpgradesData {
        message: "not a JSON array".to_string(),
        source: None,
    };

    assert!(matches!(err, MigrateError::InvalidUpgradesData { .. }));
    assert!(err.to_string().contains("not a JSON array"));
}

#[test]
fn test_range_error() {
    let err = MigrateError::RangeError {
        message: "0.5 is greater than 0.2".to_string(),
    };

    assert!(err.to_string().contains("0.5"));
}

#[test]
fn test_bad_reference_error() {
    let err = MigrateError::BadReference {
        message: "image should not include digest".to_string(),
    };

    assert!(matches!(err, MigrateError::BadReference { .. }));
}

#[test]
fn test_registry_error() {
    let err = MigrateError::RegistryError {
        message: "unexpected status".to_string(),
        status_code: Some(500),
        source: None,
    };

    assert!(err.to_string().contains("500"));
}

#[test]
fn test_incorrect_migration_attachment_error() {
    let err = MigrateError::IncorrectMigrationAttachment {
        message: "2 referrers containing migration script are listed".to_string(),
    };

    assert!(matches!(err, MigrateError::IncorrectMigrationAttachment { .. }));
}

#[test]
fn test_missing_pipeline_file_error() {
    let err = MigrateError::MissingPipelineFile {
        path: "pipeline.yaml".to_string(),
    };

    assert!(err.to_string().contains("pipeline.yaml"));
}

#[test]
fn test_migration_failed_error() {
    let err = MigrateError::MigrationFailed {
        task_bundle: "quay.io/konflux-ci/foo:0.2-bbbb@sha256:bbbb".to_string(),
        message: "exit status 1".to_string(),
    };

    assert!(err.to_string().contains("quay.io/konflux-ci/foo"));
    assert!(err.to_string().contains("exit status 1"));
}

#[test]
fn test_validation_error_digest_mismatch() {
    let err = MigrateError::Validation {
        message: "digest mismatch".to_string(),
        source: None,
    };

    assert!(err.to_string().contains("digest mismatch"));
}

#[test]
fn test_config_error_invalid_file() {
    let err = MigrateError::Config {
        message: "invalid config file".to_string(),
        path: Some("/path/to/config.yaml".to_string()),
        source: None,
    };

    assert!(matches!(err, MigrateError::Config { .. }));
    assert!(err.to_string().contains("invalid config file"));
}

#[test]
fn test_error_implements_error_trait() {
    let err = MigrateError::Network {
        message: "test error".to_string(),
        source: None,
    };

    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_implements_debug() {
    let err = MigrateError::Network {
        message: "connection failed".to_string(),
        source: None,
    };

    let debug_str = format!("{:?}", err);
    assert!(!debug_str.is_empty());
}

#[test]
fn test_config_error_with_source() {
    let source_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");

    let err = MigrateError::Config {
        message: "failed to read config".to_string(),
        path: Some("/path/to/config.yaml".to_string()),
        source: Some(Box::new(source_error)),
    };

    assert!(err.source().is_some());
    assert!(err.source().unwrap().to_string().contains("file not found"));
}

// Tests for helper constructors

#[test]
fn test_network_helper_constructor() {
    let err = MigrateError::network("connection refused");
    assert!(matches!(err, MigrateError::Network { .. }));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_network_with_source_helper_constructor() {
    let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    let err = MigrateError::network_with_source("failed to connect", io_err);
    assert!(matches!(err, MigrateError::Network { .. }));
    assert!(err.source().is_some());
}

#[test]
fn test_registry_helper_constructor() {
    let err = MigrateError::registry("unexpected status", Some(404));
    assert!(matches!(err, MigrateError::RegistryError { .. }));
    assert!(err.to_string().contains("404"));
}

#[test]
fn test_range_helper_constructor() {
    let err = MigrateError::range("from version greater than to version");
    assert!(matches!(err, MigrateError::RangeError { .. }));
}

#[test]
fn test_bad_reference_helper_constructor() {
    let err = MigrateError::bad_reference("missing digest");
    assert!(matches!(err, MigrateError::BadReference { .. }));
}

#[test]
fn test_incorrect_migration_attachment_helper_constructor() {
    let err = MigrateError::incorrect_migration_attachment("too many referrers");
    assert!(matches!(err, MigrateError::IncorrectMigrationAttachment { .. }));
}

#[test]
fn test_missing_pipeline_file_helper_constructor() {
    let err = MigrateError::missing_pipeline_file("pipeline.yaml");
    assert!(matches!(err, MigrateError::MissingPipelineFile { .. }));
}

#[test]
fn test_migration_failed_helper_constructor() {
    let err = MigrateError::migration_failed("bundle:0.2@sha256:aa", "non-zero exit");
    assert!(matches!(err, MigrateError::MigrationFailed { .. }));
}

#[test]
fn test_io_helper_constructor() {
    let err = MigrateError::io("failed to open scratch file");
    assert!(matches!(err, MigrateError::Io { .. }));
}

#[test]
fn test_yaml_helper_constructor() {
    let err = MigrateError::yaml("invalid mapping");
    assert!(matches!(err, MigrateError::Yaml { .. }));
}

#[test]
fn test_validation_helper_constructor() {
    let err = MigrateError::validation("invalid manifest format");
    assert!(matches!(err, MigrateError::Validation { .. }));
    assert!(err.to_string().contains("invalid manifest format"));
}

#[test]
fn test_validation_with_source_helper_constructor() {
    let io_err = std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid data");
    let err = MigrateError::validation_with_source("invalid format", io_err);
    assert!(matches!(err, MigrateError::Validation { .. }));
    assert!(err.source().is_some());
}

#[test]
fn test_config_helper_constructor() {
    let err = MigrateError::config("invalid config file", Some("/path/to/config.yaml"));
    assert!(matches!(err, MigrateError::Config { .. }));
    assert!(err.to_string().contains("invalid config file"));
}

#[test]
fn test_config_with_source_helper_constructor() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err = MigrateError::config_with_source(
        "failed to read config",
        Some("/path/to/config.yaml"),
        io_err,
    );
    assert!(matches!(err, MigrateError::Config { .. }));
    assert!(err.source().is_some());
}
