//! Error types for the pipeline migration tool.
//!
//! This module provides a single structured error type shared by every
//! component of the core library. All variants implement the standard
//! `Error` trait and carry enough context to render a precise message.

use thiserror::Error;

#[cfg(test)]
mod tests;

/// Main error type for pipeline migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// The raw upgrades input failed schema validation or could not be decoded.
    #[error("Invalid upgrades data: {message}")]
    InvalidUpgradesData {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// `currentValue` parses to a version greater than `newValue`.
    #[error("Range error: {message}")]
    RangeError { message: String },

    /// A reference was malformed for the operation attempted (e.g. a digest
    /// where none was expected, or a missing digest where one is required).
    #[error("Bad reference: {message}")]
    BadReference { message: String },

    /// Network-related errors (connection, timeout, DNS).
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A registry call returned a non-200 response or a malformed body.
    #[error("Registry error (status: {status_code:?}): {message}")]
    RegistryError {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// More than one referrer was annotated as the migration for one bundle.
    #[error("Incorrect migration attachment: {message}")]
    IncorrectMigrationAttachment { message: String },

    /// A package file named in the upgrades input does not exist on disk.
    #[error("Missing pipeline file: {path}")]
    MissingPipelineFile { path: String },

    /// A migration script exited with a non-zero status.
    #[error("Migration failed for task bundle {task_bundle}: {message}")]
    MigrationFailed {
        task_bundle: String,
        message: String,
    },

    /// Local filesystem or scratch-file I/O failure.
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// YAML parsing or dumping failure.
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors (invalid manifest, digest mismatch, invalid reference).
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid config file, missing settings).
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MigrateError {
    pub fn invalid_upgrades_data(message: impl Into<String>) -> Self {
        Self::InvalidUpgradesData {
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_upgrades_data_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InvalidUpgradesData {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::RangeError {
            message: message.into(),
        }
    }

    pub fn bad_reference(message: impl Into<String>) -> Self {
        Self::BadReference {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn registry(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::RegistryError {
            message: message.into(),
            status_code,
            source: None,
        }
    }

    pub fn registry_with_source(
        message: impl Into<String>,
        status_code: Option<u16>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::RegistryError {
            message: message.into(),
            status_code,
            source: Some(Box::new(source)),
        }
    }

    pub fn incorrect_migration_attachment(message: impl Into<String>) -> Self {
        Self::IncorrectMigrationAttachment {
            message: message.into(),
        }
    }

    pub fn missing_pipeline_file(path: impl Into<String>) -> Self {
        Self::MissingPipelineFile { path: path.into() }
    }

    pub fn migration_failed(task_bundle: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MigrationFailed {
            task_bundle: task_bundle.into(),
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    pub fn io_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn yaml(message: impl Into<String>) -> Self {
        Self::Yaml {
            message: message.into(),
            source: None,
        }
    }

    pub fn yaml_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Yaml {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    pub fn validation_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn config(message: impl Into<String>, path: Option<impl Into<String>>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(Into::into),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        path: Option<impl Into<String>>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(Into::into),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias for pipeline migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
