//! Application configuration.
//!
//! Loads settings from sensible defaults, an optional YAML file, and
//! environment variables, in that order of increasing precedence.

use crate::error::{MigrateError, Result};
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};


/// Which resolver strategy to use when no `-l`/`--use-legacy-resolver` flag
/// is given on the command line.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResolverStrategy {
    /// Walk the linked-list of migration annotations.
    #[default]
    Linked,
    /// Check every task bundle in the upgrade range individually.
    Simple,
}

/// Root configuration structure.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_registry_timeout_secs")]
    pub registry_timeout_secs: u64,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default)]
    pub default_resolver: ResolverStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_timeout_secs: default_registry_timeout_secs(),
            cache_dir: default_cache_dir(),
            default_resolver: ResolverStrategy::default(),
        }
    }
}

fn default_registry_timeout_secs() -> u64 {
    30
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("pipeline-migration-tool")
}

impl Config {
    /// Parses a `Config` from a YAML string. Primarily used for testing.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(Self::defaults_source()?)
            .add_source(File::from_str(s, FileFormat::Yaml));
        Self::from_builder(builder)
    }

    /// Loads a `Config` from an optional file path, layered over defaults
    /// and environment variables prefixed `PMT_`.
    ///
    /// If `path` is `None` or the file does not exist, only defaults and
    /// environment overrides apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigRs::builder().add_source(Self::defaults_source()?);

        if let Some(p) = path
            && p.exists()
        {
            builder = builder.add_source(File::from(p).required(true));
        }

        builder = builder.add_source(config::Environment::with_prefix("PMT"));

        Self::from_builder(builder)
    }

    fn defaults_source() -> Result<ConfigRs> {
        ConfigRs::try_from(&Config::default())
            .map_err(|e| MigrateError::config_with_source("failed to build default configuration", None::<String>, e))
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                MigrateError::config_with_source("failed to deserialize configuration", None::<String>, e)
            })
    }
}
