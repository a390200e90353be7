//! Upgrade-range resolution: which task bundle tags lie between a
//! dependency's current and new version.

use crate::error::{MigrateError, Result};
use crate::migrate::types::{QuayTagInfo, TaskBundleUpgrade};
use crate::reference::Container;
use crate::registry::list_active_repo_tags;
use regex::Regex;
use std::sync::OnceLock;


/// Example: `0.1-18a61693389c6c912df587f31bc3b4cc53eb0d5b`.
const TASK_TAG_PATTERN: &str = r"^[0-9.]+-[0-9a-f]+$";

fn task_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TASK_TAG_PATTERN).expect("task tag pattern is a valid regex"))
}

/// Parses `major.minor` from a version string, defaulting the minor
/// component to 0 when absent (e.g. bare `"3"` or `"3.0"` tags from the
/// decentralized tag scheme).
fn parse_version(version: &str) -> Result<(u64, u64)> {
    let mut parts = version.split('.');
    let major = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MigrateError::validation(format!("invalid version: {}", version)))?
        .parse::<u64>()
        .map_err(|e| MigrateError::validation_with_source(format!("invalid major version in {}", version), e))?;
    let minor = match parts.next() {
        Some(m) => m
            .parse::<u64>()
            .map_err(|e| MigrateError::validation_with_source(format!("invalid minor version in {}", version), e))?,
        None => 0,
    };
    Ok((major, minor))
}

fn parse_tag_version(tag_name: &str) -> Result<(u64, u64)> {
    let prefix = tag_name.split('-').next().unwrap_or(tag_name);
    parse_version(prefix)
}

/// Expands a `from..=to` minor-version range into dotted version strings.
///
/// ```text
/// expand_versions("0.2", "0.2") == ["0.2"]
/// expand_versions("0.2", "0.5") == ["0.2", "0.3", "0.4", "0.5"]
/// ```
///
/// Only the minor component drives the expansion; this matches the
/// build-definitions CI versioning scheme, which is minor-version only.
pub fn expand_versions(from: &str, to: &str) -> Result<Vec<String>> {
    let from_version = parse_version(from)?;
    let to_version = parse_version(to)?;
    if from_version > to_version {
        return Err(MigrateError::range(format!(
            "from version {} is greater than the to version {}",
            from, to
        )));
    }
    Ok((from_version.1..=to_version.1).map(|minor| format!("0.{}", minor)).collect())
}

/// Lists every tag across the version range `[currentValue, newValue]` for
/// `bundle_upgrade`'s dependency, newest-first by creation time.
pub async fn list_bundle_tags(
    http: &reqwest::Client,
    scheme: &str,
    bundle_upgrade: &TaskBundleUpgrade,
) -> Result<Vec<QuayTagInfo>> {
    let versions = expand_versions(&bundle_upgrade.current_value, &bundle_upgrade.new_value)?;
    let container = Container::from_repo(&bundle_upgrade.dep_name)?;
    let api_base = format!("{}://{}", scheme, container.registry());

    let mut tags = Vec::new();
    for version in &versions {
        let prefix = format!("{}-", version);
        let found =
            list_active_repo_tags(http, &api_base, container.namespace(), container.repository(), Some(&prefix))
                .await?;
        if found.is_empty() {
            log::info!("No tag is queried from registry for version {}", version);
            continue;
        }
        tags.extend(found);
    }

    tags.sort_by(|a, b| b.start_ts.cmp(&a.start_ts));
    Ok(tags)
}

/// Keeps only tags pinned by version and revision, e.g. `0.2-abcdef`.
pub fn only_tags_pinned_by_version_revision(tags_info: &[QuayTagInfo]) -> Vec<QuayTagInfo> {
    let regex = task_tag_regex();
    tags_info.iter().filter(|t| regex.is_match(&t.name)).cloned().collect()
}

/// Drops tags that are out of order relative to version history.
///
/// Once a newer version is tagged for a task, an older version tagged after
/// it is "out of order" and dropped — it cannot be part of a consistent
/// upgrade range. Returns the pruned, newest-first tag list, the tag
/// matching `bundle_upgrade`'s current digest (if retained in the unpruned
/// input), the tag matching the new digest, and whether the current tag was
/// itself out of order.
pub fn drop_out_of_order_versions(
    tags_info: &[QuayTagInfo],
    bundle_upgrade: &TaskBundleUpgrade,
) -> Result<(Vec<QuayTagInfo>, Option<QuayTagInfo>, Option<QuayTagInfo>, bool)> {
    let mut kept: Vec<QuayTagInfo> = Vec::new();
    let mut highest_seen: Option<(u64, u64)> = None;
    let mut is_out_of_order = false;
    let mut current_tag_info: Option<QuayTagInfo> = None;
    let mut new_tag_info: Option<QuayTagInfo> = None;

    for tag in tags_info.iter().rev() {
        let version = parse_tag_version(&tag.name)?;

        if current_tag_info.is_none() && tag.manifest_digest == bundle_upgrade.current_digest {
            current_tag_info = Some(tag.clone());
            if let Some(highest) = highest_seen {
                if version < highest {
                    is_out_of_order = true;
                }
            }
        } else if new_tag_info.is_none() && tag.manifest_digest == bundle_upgrade.new_digest {
            new_tag_info = Some(tag.clone());
        }

        let keep = match highest_seen {
            None => true,
            Some(highest) => version >= highest,
        };
        if keep {
            kept.push(tag.clone());
            highest_seen = Some(version);
        }
    }

    kept.sort_by(|a, b| b.start_ts.cmp(&a.start_ts));
    Ok((kept, current_tag_info, new_tag_info, is_out_of_order))
}

/// Determines the upgrade range for one bundle upgrade: the tags strictly
/// between the current bundle (exclusive) and the new bundle (inclusive),
/// newest-first. Returns an empty range (with a warning logged) if either
/// bundle cannot be found in the registry's tag history — this signals an
/// unsupported tag scheme rather than a hard failure.
pub async fn determine_task_bundle_upgrades_range(
    http: &reqwest::Client,
    scheme: &str,
    bundle_upgrade: &TaskBundleUpgrade,
) -> Result<Vec<QuayTagInfo>> {
    let tags = list_bundle_tags(http, scheme, bundle_upgrade).await?;
    let pinned = only_tags_pinned_by_version_revision(&tags);
    let (tags_info, current_tag_info, new_tag_info, is_out_of_order) =
        drop_out_of_order_versions(&pinned, bundle_upgrade)?;

    let current_bundle_ref = bundle_upgrade.current_bundle();
    let new_bundle_ref = bundle_upgrade.new_bundle();

    let Some(current_tag_info) = current_tag_info else {
        log::warn!("Registry does not have current bundle {}", current_bundle_ref);
        return Ok(Vec::new());
    };
    let Some(new_tag_info) = new_tag_info else {
        log::warn!("Registry does not have new bundle {}", new_bundle_ref);
        return Ok(Vec::new());
    };

    let mut current_pos: Option<usize> = None;
    let mut new_pos: Option<usize> = None;
    for (i, tag) in tags_info.iter().enumerate() {
        if tag.manifest_digest == new_tag_info.manifest_digest {
            new_pos = Some(i);
        } else if tag.manifest_digest == current_tag_info.manifest_digest {
            current_pos = Some(i);
        }
    }

    let range = if is_out_of_order {
        log::info!(
            "Current bundle {} is newer than new bundle {}",
            current_bundle_ref,
            new_bundle_ref
        );
        let new_pos = new_pos.unwrap_or(tags_info.len());
        tags_info[new_pos..].to_vec()
    } else {
        let new_pos = new_pos.unwrap_or(0);
        let current_pos = current_pos.unwrap_or(tags_info.len());
        if new_pos > current_pos {
            Vec::new()
        } else {
            tags_info[new_pos..current_pos].to_vec()
        }
    };

    Ok(range)
}
