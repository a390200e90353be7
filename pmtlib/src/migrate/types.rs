//! Data types shared across the migration pipeline.

use serde::Deserialize;

pub use crate::registry::QuayTagInfo;

/// One Renovate upgrade record after it has passed [`crate::migrate::clean::clean_upgrades`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRecord {
    pub dep_name: String,
    pub current_value: String,
    pub current_digest: String,
    pub new_value: String,
    pub new_digest: String,
    pub dep_types: Vec<String>,
    pub package_file: String,
    pub parent_dir: String,
}

/// A migration script attached to one specific task bundle tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBundleMigration {
    /// Complete image reference, with both tag and digest.
    pub task_bundle: String,
    pub migration_script: String,
}

/// One dependency upgrade: a task bundle moving from `current_value` to
/// `new_value`, with the migrations discovered for the bundles in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBundleUpgrade {
    pub dep_name: String,
    pub current_value: String,
    pub current_digest: String,
    pub new_value: String,
    pub new_digest: String,

    /// Populated by a resolver; ordered oldest-first once resolved.
    pub migrations: Vec<TaskBundleMigration>,
}

impl TaskBundleUpgrade {
    pub fn new(record: &UpgradeRecord) -> Self {
        Self {
            dep_name: record.dep_name.clone(),
            current_value: record.current_value.clone(),
            current_digest: record.current_digest.clone(),
            new_value: record.new_value.clone(),
            new_digest: record.new_digest.clone(),
            migrations: Vec::new(),
        }
    }

    /// The dedup identity key: a complete image reference for the current bundle.
    pub fn current_bundle(&self) -> String {
        format!("{}:{}@{}", self.dep_name, self.current_value, self.current_digest)
    }

    /// A complete image reference for the new bundle.
    pub fn new_bundle(&self) -> String {
        format!("{}:{}@{}", self.dep_name, self.new_value, self.new_digest)
    }
}

/// A pipeline or pipeline-run file tracked by Renovate, identified by path,
/// referencing the task bundle upgrades that apply to it by their
/// [`TaskBundleUpgrade::current_bundle`] key.
///
/// Upgrades are deduplicated in the manager's owning map and referenced here
/// by key rather than by value, since more than one package file can share
/// the same upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub file_path: String,
    pub parent_dir: String,
    pub upgrade_keys: Vec<String>,
}
