//! Task bundle migration discovery and application.
//!
//! A Renovate upgrade bumps a Tekton task bundle's image digest. Between the
//! bundle's current and new tag there may be any number of intermediate
//! releases, each of which can carry a migration script attached as an OCI
//! referrer. This module discovers those scripts, orders them, and applies
//! them in sequence to the pipeline definitions that reference the bundle.

/// Set on a referrer manifest that is itself a migration script.
pub const ANNOTATION_IS_MIGRATION: &str = "dev.konflux-ci.task.is-migration";
/// Set on a task bundle manifest that has a migration script attached.
pub const ANNOTATION_HAS_MIGRATION: &str = "dev.konflux-ci.task.has-migration";
/// Set on a migration script manifest, pointing back at the previous
/// migration bundle in the linked-list chain.
pub const ANNOTATION_PREVIOUS_MIGRATION_BUNDLE: &str = "dev.konflux-ci.task.previous-migration-bundle";

pub mod types;
pub use types::{PackageFile, QuayTagInfo, TaskBundleMigration, TaskBundleUpgrade, UpgradeRecord};

pub mod range;
pub use range::{determine_task_bundle_upgrades_range, drop_out_of_order_versions, expand_versions, list_bundle_tags};

pub mod fetch;
pub use fetch::fetch_migration_script;

pub mod resolver;
pub use resolver::{resolve, ResolverStrategy};

pub mod apply;
pub use apply::apply_to_package_file;

pub mod manager;
pub use manager::TaskBundleUpgradesManager;

pub mod clean;
pub use clean::{clean_upgrades, comes_from_konflux};

use crate::error::Result;
use crate::registry::RegistryClient;

/// Runs the full migration pipeline over a batch of already-cleaned upgrade
/// records: groups them by package file, resolves migrations concurrently,
/// then applies each package file's migrations in sequence.
pub async fn migrate(
    records: &[UpgradeRecord],
    registry: &RegistryClient,
    http: &reqwest::Client,
    scheme: &str,
    strategy: ResolverStrategy,
) -> Result<()> {
    let mut manager = TaskBundleUpgradesManager::new(records);
    manager.resolve_migrations(registry, http, scheme, strategy).await?;
    manager.apply_migrations().await
}
