//! Migration discovery strategies.
//!
//! Walking a task bundle's upgrade range and deciding which tags carry a
//! migration script can be done two ways: check every tag in the range
//! (`SimpleIteration`), or follow the `previous-migration-bundle` annotation
//! as a linked list from the newest tag backwards (`Linked`). Both produce
//! the same `TaskBundleMigration` list, newest-first, which [`resolve`]
//! reverses into application order before returning.

use crate::error::{MigrateError, Result};
use crate::migrate::fetch::fetch_migration_script;
use crate::migrate::range::determine_task_bundle_upgrades_range;
use crate::migrate::types::{QuayTagInfo, TaskBundleMigration, TaskBundleUpgrade};
use crate::migrate::{ANNOTATION_HAS_MIGRATION, ANNOTATION_PREVIOUS_MIGRATION_BUNDLE};
use crate::reference::Container;
use crate::registry::RegistryClient;
use tokio::task::JoinSet;

#[cfg(test)]
mod tests;

fn is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Which discovery strategy to use when resolving a task bundle upgrade's migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverStrategy {
    /// Legacy resolution: checks every tag in the upgrade range individually.
    SimpleIteration,
    /// Follows the bundle image's `previous-migration-bundle` annotation chain.
    Linked,
}

impl ResolverStrategy {
    async fn resolve_migrations(
        self,
        registry: &RegistryClient,
        dep_name: &str,
        upgrades_range: &[QuayTagInfo],
    ) -> Result<Vec<TaskBundleMigration>> {
        match self {
            ResolverStrategy::SimpleIteration => resolve_simple_iteration(registry, dep_name, upgrades_range).await,
            ResolverStrategy::Linked => resolve_linked(registry, dep_name, upgrades_range).await,
        }
    }
}

async fn manifest_for_tag(
    registry: &RegistryClient,
    dep_name: &str,
    tag: &QuayTagInfo,
) -> Result<(String, serde_json::Value)> {
    let container = Container::from_repo(dep_name)?.with_digest(tag.manifest_digest.clone());
    let uri_with_tag = format!("{}:{}@{}", dep_name, tag.name, tag.manifest_digest);
    let manifest = registry.get_manifest(&container).await?;
    Ok((uri_with_tag, manifest))
}

fn has_migration_annotation(manifest: &serde_json::Value) -> bool {
    manifest
        .get("annotations")
        .and_then(|a| a.get(ANNOTATION_HAS_MIGRATION))
        .and_then(|v| v.as_str())
        .map(is_true)
        .unwrap_or(false)
}

async fn resolve_simple_iteration(
    registry: &RegistryClient,
    dep_name: &str,
    upgrades_range: &[QuayTagInfo],
) -> Result<Vec<TaskBundleMigration>> {
    let mut migrations = Vec::new();
    for tag in upgrades_range {
        let (uri_with_tag, manifest) = manifest_for_tag(registry, dep_name, tag).await?;
        if !has_migration_annotation(&manifest) {
            continue;
        }
        match fetch_migration_script(registry, dep_name, &tag.manifest_digest).await? {
            Some(script) => {
                log::info!("Task bundle {} has migration.", uri_with_tag);
                migrations.push(TaskBundleMigration {
                    task_bundle: uri_with_tag,
                    migration_script: script,
                });
            }
            None => log::info!("Task bundle {} does not have migration.", uri_with_tag),
        }
    }
    Ok(migrations)
}

async fn resolve_linked(
    registry: &RegistryClient,
    dep_name: &str,
    upgrades_range: &[QuayTagInfo],
) -> Result<Vec<TaskBundleMigration>> {
    if upgrades_range.is_empty() {
        log::info!("Upgrade range is empty for {}. Skip resolving migrations.", dep_name);
        return Ok(Vec::new());
    }

    let manifest_digests: Vec<&str> = upgrades_range.iter().map(|t| t.manifest_digest.as_str()).collect();
    let mut migrations = Vec::new();
    let mut i = 0usize;

    loop {
        let tag = &upgrades_range[i];
        let (uri_with_tag, manifest) = manifest_for_tag(registry, dep_name, tag).await?;

        if has_migration_annotation(&manifest) {
            match fetch_migration_script(registry, dep_name, &tag.manifest_digest).await? {
                Some(script) => {
                    log::info!("Task bundle {} has migration.", uri_with_tag);
                    migrations.push(TaskBundleMigration {
                        task_bundle: uri_with_tag.clone(),
                        migration_script: script,
                    });
                }
                None => log::info!("Task bundle {} does not have migration.", uri_with_tag),
            }
        }

        let previous_digest = manifest
            .get("annotations")
            .and_then(|a| a.get(ANNOTATION_PREVIOUS_MIGRATION_BUNDLE))
            .and_then(|v| v.as_str())
            .unwrap_or("");

        if previous_digest.is_empty() {
            log::info!("Migration search stops at {}", uri_with_tag);
            break;
        }

        match manifest_digests.iter().position(|d| *d == previous_digest) {
            Some(pos) => i = pos,
            None => {
                log::info!(
                    "Migration search stops at {}. It points to a previous migration bundle {} that is before the current upgrade.",
                    uri_with_tag, previous_digest
                );
                break;
            }
        }
    }

    Ok(migrations)
}

async fn resolve_one(
    registry: &RegistryClient,
    http: &reqwest::Client,
    scheme: &str,
    strategy: ResolverStrategy,
    tb_upgrade: &TaskBundleUpgrade,
) -> Result<Vec<TaskBundleMigration>> {
    let upgrades_range = determine_task_bundle_upgrades_range(http, scheme, tb_upgrade).await?;
    strategy.resolve_migrations(registry, &tb_upgrade.dep_name, &upgrades_range).await
}

/// Resolves migrations for every upgrade concurrently, writing the result
/// into each upgrade's `migrations` field in place, ordered oldest-to-newest.
///
/// Quay.io lists tags newest-first, so each strategy discovers migrations in
/// that order too; they are reversed here before being stored. If any
/// upgrade's resolution fails, the remaining in-flight work is cancelled and
/// the error is returned.
pub async fn resolve(
    registry: &RegistryClient,
    http: &reqwest::Client,
    scheme: &str,
    strategy: ResolverStrategy,
    tb_upgrades: &mut [TaskBundleUpgrade],
) -> Result<()> {
    let mut join_set = JoinSet::new();
    for (index, upgrade) in tb_upgrades.iter().enumerate() {
        let registry = registry.clone();
        let http = http.clone();
        let scheme = scheme.to_string();
        let upgrade = upgrade.clone();
        join_set.spawn(async move {
            let result = resolve_one(&registry, &http, &scheme, strategy, &upgrade).await;
            (index, result)
        });
    }

    let mut results: Vec<Option<Vec<TaskBundleMigration>>> = vec![None; tb_upgrades.len()];
    while let Some(joined) = join_set.join_next().await {
        let (index, result) =
            joined.map_err(|e| MigrateError::io_with_source("migration resolution task panicked", e))?;
        results[index] = Some(result?);
    }

    for (upgrade, migrations) in tb_upgrades.iter_mut().zip(results) {
        let mut migrations = migrations.expect("every spawned task reports its result before join_next returns None");
        migrations.reverse();
        upgrade.migrations = migrations;
    }
    Ok(())
}
