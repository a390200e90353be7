//! Applies resolved migrations to pipeline files on disk.
//!
//! Every migration script for a package file runs in order, each invoked as
//! `bash <script> <file>` against either the file itself (a plain pipeline)
//! or a scratch copy of its embedded `spec.pipelineSpec` (a pipeline-run).
//! The original YAML is only reloaded and re-dumped through the
//! style-preserving serializer when a script actually changed the file —
//! migration scripts are expected to be idempotent no-ops most of the time.

use crate::error::{MigrateError, Result};
use crate::migrate::types::TaskBundleUpgrade;
use crate::yaml::{self, YAMLStyle};
use serde_yaml::{Mapping, Value};
use sha2::{Digest as _, Sha256};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::Builder;
use tokio::process::Command;


fn checksum(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| MigrateError::io_with_source(format!("failed to read {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(s, "{:02x}", byte).expect("writing to a String never fails");
    }
    s
}

/// Runs every migration script for `upgrades`, in order, against `file_path`.
/// Scripts are written into a single reused scratch file, truncated before
/// each rewrite so stale bytes from a previous, longer script never leak
/// into a shorter one.
async fn apply_migration_batch(file_path: &Path, upgrades: &[TaskBundleUpgrade]) -> Result<()> {
    let mut scratch = Builder::new()
        .suffix("-migration-file")
        .tempfile()
        .map_err(|e| MigrateError::io_with_source("failed to create migration scratch file", e))?;
    let mut prev_size: u64 = 0;

    for upgrade in upgrades {
        for migration in &upgrade.migrations {
            log::info!(
                "Apply migration of task bundle {} in package file {}",
                migration.task_bundle,
                file_path.display()
            );

            let content = migration.migration_script.as_bytes();
            let file = scratch.as_file_mut();
            file.seek(SeekFrom::Start(0))
                .map_err(|e| MigrateError::io_with_source("failed to seek migration scratch file", e))?;
            if (content.len() as u64) < prev_size {
                file.set_len(content.len() as u64)
                    .map_err(|e| MigrateError::io_with_source("failed to truncate migration scratch file", e))?;
            }
            file.write_all(content)
                .map_err(|e| MigrateError::io_with_source("failed to write migration scratch file", e))?;
            prev_size = content.len() as u64;

            let output = Command::new("bash")
                .arg(scratch.path())
                .arg(file_path)
                .output()
                .await
                .map_err(|e| MigrateError::io_with_source("failed to run migration script", e))?;

            log::debug!("{}", String::from_utf8_lossy(&output.stdout));
            if !output.status.success() {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                return Err(MigrateError::migration_failed(migration.task_bundle.clone(), combined));
            }
        }
    }
    Ok(())
}

fn is_pipeline_run(doc: &Value) -> bool {
    doc.get("spec").and_then(|s| s.get("pipelineSpec")).is_some()
}

async fn handle_pipeline_file(file_path: &Path, upgrades: &[TaskBundleUpgrade], style: &YAMLStyle) -> Result<()> {
    let original_checksum = checksum(file_path)?;
    apply_migration_batch(file_path, upgrades).await?;

    if checksum(file_path)? != original_checksum {
        let (value, _) = yaml::load(file_path)?;
        yaml::dump(file_path, &value, Some(style))?;
    }
    Ok(())
}

async fn handle_pipeline_run_file(
    file_path: &Path,
    doc: &mut Value,
    upgrades: &[TaskBundleUpgrade],
    style: &YAMLStyle,
) -> Result<()> {
    let pipeline_spec = doc
        .get("spec")
        .and_then(|s| s.get("pipelineSpec"))
        .cloned()
        .ok_or_else(|| MigrateError::validation("pipeline-run file has no spec.pipelineSpec"))?;

    let mut wrapped_spec = Mapping::new();
    wrapped_spec.insert(Value::String("pipelineSpec".to_string()), pipeline_spec);
    let mut wrapper = Mapping::new();
    wrapper.insert(Value::String("spec".to_string()), Value::Mapping(wrapped_spec));

    let scratch = Builder::new()
        .suffix("-pipeline")
        .tempfile()
        .map_err(|e| MigrateError::io_with_source("failed to create pipeline scratch file", e))?;
    yaml::dump(scratch.path(), &Value::Mapping(wrapper), Some(style))?;
    let original_checksum = checksum(scratch.path())?;

    apply_migration_batch(scratch.path(), upgrades).await?;

    if checksum(scratch.path())? != original_checksum {
        let (modified, _) = yaml::load(scratch.path())?;
        let modified_spec = modified
            .get("spec")
            .and_then(|s| s.get("pipelineSpec"))
            .cloned()
            .ok_or_else(|| MigrateError::validation("migrated pipeline scratch file lost spec.pipelineSpec"))?;

        let spec_mapping = doc
            .get_mut("spec")
            .and_then(|s| s.as_mapping_mut())
            .ok_or_else(|| MigrateError::validation("pipeline-run file has no spec mapping"))?;
        spec_mapping.insert(Value::String("pipelineSpec".to_string()), modified_spec);

        yaml::dump(file_path, doc, Some(style))?;
    }
    Ok(())
}

/// Applies every migration in `upgrades` to the package file at `file_path`,
/// dispatching to the plain-pipeline or pipeline-run handling depending on
/// whether the document embeds `spec.pipelineSpec`.
pub async fn apply_to_package_file(file_path: &Path, upgrades: &[TaskBundleUpgrade]) -> Result<()> {
    if !file_path.exists() {
        return Err(MigrateError::missing_pipeline_file(file_path.display().to_string()));
    }

    let (mut doc, style) = yaml::load(file_path)?;

    if is_pipeline_run(&doc) {
        handle_pipeline_run_file(file_path, &mut doc, upgrades, &style).await
    } else {
        handle_pipeline_file(file_path, upgrades, &style).await
    }
}
