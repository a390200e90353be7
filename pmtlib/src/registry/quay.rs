//! Quay.io repository tag listing.
//!
//! Quay.io exposes a tag-history API richer than the plain OCI tag list:
//! each entry carries the manifest digest it pointed to and the timestamp
//! it was created, which the upgrade-range resolver needs to reconstruct
//! version history. This lives apart from the OCI-generic [`super::RegistryClient`]
//! because it speaks Quay's own JSON shape, not the Distribution Specification.

use crate::error::{MigrateError, Result};
use reqwest::Client as HttpClient;
use serde::Deserialize;


/// One entry in a Quay.io repository's tag history.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct QuayTagInfo {
    pub name: String,
    pub manifest_digest: String,
    pub start_ts: i64,
}

#[derive(Debug, Deserialize)]
struct PaginatedTags {
    has_additional: bool,
    tags: Vec<QuayTagInfo>,
}

/// Lists active tags of `namespace/repository` reachable at `api_base`
/// (e.g. `https://quay.io`), optionally restricted to names starting with
/// `tag_name_prefix`.
///
/// Tags are returned in the order Quay.io's API yields them (newest first
/// within a page); pages are followed until `has_additional` is false.
pub async fn list_active_repo_tags(
    http: &HttpClient,
    api_base: &str,
    namespace: &str,
    repository: &str,
    tag_name_prefix: Option<&str>,
) -> Result<Vec<QuayTagInfo>> {
    let repo_path = if namespace.is_empty() {
        repository.to_string()
    } else {
        format!("{}/{}", namespace, repository)
    };
    let url = format!("{}/api/v1/repository/{}/tag/", api_base, repo_path);

    let mut all_tags = Vec::new();
    let mut page: u32 = 1;
    loop {
        let mut query = vec![("onlyActiveTags", "true".to_string()), ("page", page.to_string())];
        if let Some(prefix) = tag_name_prefix {
            query.push(("filter_tag_name", format!("like:{}", prefix)));
        }

        let response = http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| MigrateError::network_with_source(format!("failed to list tags for {}", repo_path), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MigrateError::registry(
                format!("failed to list tags for {}: {}", repo_path, body),
                Some(status.as_u16()),
            ));
        }

        let page_data: PaginatedTags = response.json().await.map_err(|e| {
            MigrateError::validation_with_source("tag list response is not valid JSON", e)
        })?;

        let has_additional = page_data.has_additional;
        all_tags.extend(page_data.tags);

        if !has_additional {
            break;
        }
        page += 1;
    }

    Ok(all_tags)
}
