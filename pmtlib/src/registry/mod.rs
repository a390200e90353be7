//! Async OCI registry facade.
//!
//! Wraps manifest, blob and referrers lookups behind the content-addressed
//! [`crate::cache::Cache`], so repeated lookups for the same digest never
//! hit the network twice. Everything here is `async` because the resolver
//! strategies drive many of these calls concurrently across a worker pool.

use crate::cache::{blob_key, manifest_key, referrers_key, Cache};
use crate::error::{MigrateError, Result};
use crate::reference::Container;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

#[cfg(test)]
mod tests;

pub mod quay;
pub use quay::{list_active_repo_tags, QuayTagInfo};

const MEDIA_TYPE_OCI_IMAGE_MANIFEST_V1: &str = "application/vnd.oci.image.manifest.v1+json";
const MEDIA_TYPE_OCI_IMAGE_INDEX_V1: &str = "application/vnd.oci.image.index.v1+json";

/// Talks to OCI registries over HTTP(S), caching manifests, blobs and
/// referrers listings by content digest.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: HttpClient,
    cache: Cache,
    scheme: String,
}

impl RegistryClient {
    /// Creates a facade backed by `cache`, with request timeout `timeout`.
    pub fn new(cache: Cache, timeout: Duration) -> Result<Self> {
        Self::with_scheme(cache, timeout, "https")
    }

    /// Same as [`RegistryClient::new`] but lets tests point at a plain-HTTP
    /// mock server.
    pub fn with_scheme(cache: Cache, timeout: Duration, scheme: impl Into<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MigrateError::network_with_source("failed to build HTTP client", e))?;
        Ok(Self {
            http,
            cache,
            scheme: scheme.into(),
        })
    }

    /// Fetches and parses the manifest at `container`'s digest.
    pub async fn get_manifest(&self, container: &Container) -> Result<Value> {
        let digest = container
            .digest()
            .ok_or_else(|| MigrateError::bad_reference("manifest lookup requires a digest"))?;
        let key = manifest_key(container.cache_namespace(), container.repository(), digest);

        if let Some(cached) = self.cache.get_string(&key)? {
            return Self::parse_json(&cached, "cached manifest");
        }

        let url = format!("{}://{}", self.scheme, container.manifest_url(digest));
        let response = self
            .http
            .get(&url)
            .header(
                "Accept",
                format!("{}, {}", MEDIA_TYPE_OCI_IMAGE_MANIFEST_V1, MEDIA_TYPE_OCI_IMAGE_INDEX_V1),
            )
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &url))?;
        let response = Self::check_status(response, &url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| MigrateError::network_with_source("failed to read manifest response", e))?;

        self.cache.set_string(&key, &body)?;
        Self::parse_json(&body, "manifest response")
    }

    /// Fetches a blob (e.g. a migration script layer) by digest, as text.
    pub async fn get_artifact(&self, container: &Container, digest: &str) -> Result<String> {
        let key = blob_key(container.cache_namespace(), container.repository(), digest);

        if let Some(cached) = self.cache.get_string(&key)? {
            return Ok(cached);
        }

        let url = format!("{}://{}", self.scheme, container.blob_url(digest));
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &url))?;
        let response = Self::check_status(response, &url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| MigrateError::network_with_source("failed to read blob response", e))?;

        self.cache.set_string(&key, &body)?;
        Ok(body)
    }

    /// Lists referrers of `container`'s digest, optionally filtered by
    /// `artifact_type`. Returns the raw OCI image index JSON.
    pub async fn list_referrers(&self, container: &Container, artifact_type: Option<&str>) -> Result<Value> {
        let digest = container
            .digest()
            .ok_or_else(|| MigrateError::bad_reference("referrers listing requires a digest"))?;
        let key = referrers_key(container.cache_namespace(), container.repository(), digest);

        if let Some(cached) = self.cache.get_string(&key)? {
            return Self::parse_json(&cached, "cached referrers listing");
        }

        let url = format!("{}://{}", self.scheme, container.referrers_url()?);
        let mut request = self.http.get(&url);
        if let Some(t) = artifact_type {
            request = request.query(&[("artifactType", t)]);
        }
        let response = request.send().await.map_err(|e| Self::translate_reqwest_error(e, &url))?;
        let response = Self::check_status(response, &url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| MigrateError::network_with_source("failed to read referrers response", e))?;

        self.cache.set_string(&key, &body)?;
        Self::parse_json(&body, "referrers response")
    }

    /// The HTTP scheme used for this facade's requests ("http" or "https").
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// A shared handle to the underlying HTTP client, for callers (such as
    /// the Quay tag API) that need to issue requests outside the OCI
    /// Distribution Specification surface this facade covers.
    pub fn http_client(&self) -> &HttpClient {
        &self.http
    }

    fn parse_json(body: &str, what: &str) -> Result<Value> {
        serde_json::from_str(body)
            .map_err(|e| MigrateError::validation_with_source(format!("{} is not valid JSON", what), e))
    }

    fn translate_reqwest_error(error: reqwest::Error, url: &str) -> MigrateError {
        if error.is_timeout() {
            MigrateError::network(format!("request to {} timed out", url))
        } else {
            MigrateError::network_with_source(format!("failed to reach {}", url), error)
        }
    }

    async fn check_status(response: Response, url: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(MigrateError::registry(format!("{} not found", url), Some(404))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MigrateError::registry(
                format!("access denied for {}: {}", url, body),
                Some(status.as_u16()),
            )),
            _ => Err(MigrateError::registry(
                format!("unexpected status from {}: {}", url, body),
                Some(status.as_u16()),
            )),
        }
    }
}
