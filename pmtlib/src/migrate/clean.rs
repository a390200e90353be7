//! Cleans and validates raw Renovate upgrade records before they reach the
//! manager: only images from the trusted Konflux task bundle organization,
//! handled by the `tekton-bundle` dependency manager, survive.

use crate::error::{MigrateError, Result};
use crate::migrate::types::UpgradeRecord;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[cfg(test)]
mod tests;

const TRUSTED_IMAGE_ORG_PREFIX: &str = "quay.io/konflux-ci/";
const SHA256_PATTERN: &str = r"^sha256:[0-9a-f]+$";

fn sha256_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SHA256_PATTERN).expect("sha256 pattern is a valid regex"))
}

/// True when `image_repo` is trusted to carry Konflux task bundle migrations.
///
/// Setting `PMT_LOCAL_TEST` overrides the check entirely, for exercising the
/// tool against bundles pushed to an arbitrary registry organization during
/// local development.
pub fn comes_from_konflux(image_repo: &str) -> bool {
    if std::env::var_os("PMT_LOCAL_TEST").is_some() {
        log::warn!(
            "Environment variable PMT_LOCAL_TEST is set. Migration tool works with images from arbitrary registry organization."
        );
        return true;
    }
    image_repo.starts_with(TRUSTED_IMAGE_ORG_PREFIX)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn non_empty_string(upgrade: &Value, field: &str) -> Result<String> {
    match upgrade.get(field).and_then(|v| v.as_str()) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(MigrateError::invalid_upgrades_data(format!(
            "Property {} is empty or missing.",
            field
        ))),
    }
}

fn digest_string(upgrade: &Value, field: &str) -> Result<String> {
    let value = non_empty_string(upgrade, field)?;
    if !sha256_regex().is_match(&value) {
        return Err(MigrateError::invalid_upgrades_data(format!(
            "Property {} does not match sha256 digest pattern: {}",
            field, value
        )));
    }
    Ok(value)
}

fn dep_types(upgrade: &Value) -> Result<Vec<String>> {
    let array = upgrade.get("depTypes").and_then(|v| v.as_array()).ok_or_else(|| {
        MigrateError::invalid_upgrades_data("Property depTypes is missing or not an array.")
    })?;
    array
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| MigrateError::invalid_upgrades_data("Property depTypes must contain only strings."))
        })
        .collect()
}

/// Cleans a raw JSON array of Renovate upgrade records: filters to Konflux
/// task bundles handled by the tekton-bundle manager, validates the
/// remaining required fields, and returns them as typed records.
pub fn clean_upgrades(input_upgrades: &str) -> Result<Vec<UpgradeRecord>> {
    let upgrades: Value = serde_json::from_str(input_upgrades).map_err(|e| {
        log::error!("Input upgrades is not a valid encoded JSON string: {}", e);
        MigrateError::invalid_upgrades_data_with_source("Input upgrades is not a valid encoded JSON string.", e)
    })?;

    let upgrades = upgrades.as_array().ok_or_else(|| {
        MigrateError::invalid_upgrades_data("Input upgrades is not a list containing Renovate upgrade mappings.")
    })?;

    let mut cleaned = Vec::new();
    for upgrade in upgrades {
        if is_falsy(upgrade) {
            continue;
        }

        let dep_name = match upgrade.get("depName").and_then(|v| v.as_str()) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => {
                return Err(MigrateError::invalid_upgrades_data(
                    "Upgrade does not have value of field depName.",
                ))
            }
        };

        if !comes_from_konflux(&dep_name) {
            log::info!("Dependency {} does not come from Konflux task definitions.", dep_name);
            continue;
        }

        let current_value = non_empty_string(upgrade, "currentValue")?;
        let current_digest = digest_string(upgrade, "currentDigest")?;
        let new_value = non_empty_string(upgrade, "newValue")?;
        let new_digest = digest_string(upgrade, "newDigest")?;
        let dep_types = dep_types(upgrade)?;
        let package_file = non_empty_string(upgrade, "packageFile")?;
        let parent_dir = non_empty_string(upgrade, "parentDir")?;

        if !dep_types.iter().any(|t| t == "tekton-bundle") {
            log::debug!("Dependency {} is not handled by tekton-bundle manager.", dep_name);
            continue;
        }

        cleaned.push(UpgradeRecord {
            dep_name,
            current_value,
            current_digest,
            new_value,
            new_digest,
            dep_types,
            package_file,
            parent_dir,
        });
    }

    Ok(cleaned)
}
