//! Migration-script discovery via the OCI referrers API.

use crate::error::{MigrateError, Result};
use crate::migrate::ANNOTATION_IS_MIGRATION;
use crate::reference::Container;
use crate::registry::RegistryClient;


const MIGRATION_ARTIFACT_TYPE: &str = "text/x-shellscript";

fn is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Fetches the migration script attached to the task bundle `image` (a bare
/// repository reference, no tag or digest) pinned to `digest`, if one
/// exists. Returns `Ok(None)` when the bundle has no migration referrer.
pub async fn fetch_migration_script(registry: &RegistryClient, image: &str, digest: &str) -> Result<Option<String>> {
    if image.contains('@') {
        return Err(MigrateError::bad_reference("image should not include a digest"));
    }
    let container = Container::from_repo(image)?.with_digest(digest);

    let image_index = registry.list_referrers(&container, Some(MIGRATION_ARTIFACT_TYPE)).await?;
    let manifests = image_index
        .get("manifests")
        .and_then(|m| m.as_array())
        .cloned()
        .unwrap_or_default();

    let migration_descriptors: Vec<_> = manifests
        .into_iter()
        .filter(|descriptor| {
            descriptor
                .get("annotations")
                .and_then(|a| a.get(ANNOTATION_IS_MIGRATION))
                .and_then(|v| v.as_str())
                .map(is_true)
                .unwrap_or(false)
        })
        .collect();

    if migration_descriptors.len() > 1 {
        let msg = format!(
            "{} referrers containing migration script are listed. However, there should be one per task bundle.",
            migration_descriptors.len()
        );
        log::warn!("{}", msg);
        return Err(MigrateError::incorrect_migration_attachment(msg));
    }

    let Some(descriptor) = migration_descriptors.into_iter().next() else {
        return Ok(None);
    };

    let migration_digest = descriptor
        .get("digest")
        .and_then(|d| d.as_str())
        .ok_or_else(|| MigrateError::validation("referrer descriptor has no digest"))?;

    let migration_container = Container::from_repo(image)?.with_digest(migration_digest);
    let manifest = registry.get_manifest(&migration_container).await?;
    let layer_digest = manifest
        .get("layers")
        .and_then(|l| l.as_array())
        .and_then(|layers| layers.first())
        .and_then(|layer| layer.get("digest"))
        .and_then(|d| d.as_str())
        .ok_or_else(|| MigrateError::validation("migration manifest has no layers"))?;

    let script = registry.get_artifact(&migration_container, layer_digest).await?;
    Ok(Some(script))
}
