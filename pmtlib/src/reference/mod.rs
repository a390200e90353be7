//! OCI Image Reference parsing and manipulation.
//!
//! This module provides a wrapper around the `oci_spec::image::Reference`
//! type to integrate with the crate's error handling and provide a consistent API.

use crate::error::{MigrateError, Result};
use oci_spec::distribution::Reference as OciReference;
use std::fmt;
use std::str::FromStr;


/// Represents an OCI image reference, wrapping `oci_spec::distribution::Reference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference(OciReference);

impl FromStr for Reference {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_reference = OciReference::from_str(s).map_err(|e| {
            MigrateError::validation_with_source(format!("invalid image reference: {}", e), e)
        })?;
        Ok(Reference(oci_reference))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Reference {
    /// Returns the registry part of the reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use pmtlib::reference::Reference;
    /// use std::str::FromStr;
    ///
    /// let reference = Reference::from_str("ghcr.io/user/repo:latest").unwrap();
    /// assert_eq!(reference.registry(), "ghcr.io");
    /// ```
    pub fn registry(&self) -> &str {
        self.0.registry()
    }

    /// Returns the repository part of the reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use pmtlib::reference::Reference;
    /// use std::str::FromStr;
    ///
    /// let reference = Reference::from_str("ghcr.io/user/repo:latest").unwrap();
    /// assert_eq!(reference.repository(), "user/repo");
    /// ```
    pub fn repository(&self) -> &str {
        self.0.repository()
    }

    /// Returns the repository part, optionally stripping auto-added "library/" prefix.
    ///
    /// The oci-spec library automatically adds "library/" prefix for simple repository
    /// names (e.g., "golang" → "library/golang") following Docker Hub convention.
    ///
    /// When `dockerhub_compat` is false, this method strips the "library/" prefix
    /// ONLY if it was auto-added (i.e., the rest has no slashes). User-provided
    /// "library/" prefixes in paths like "library/myrepo/subpath" are preserved.
    ///
    /// # Arguments
    ///
    /// * `dockerhub_compat` - If true, keeps "library/" prefix; if false, strips auto-added prefix
    ///
    /// # Examples
    ///
    /// ```
    /// use pmtlib::reference::Reference;
    /// use std::str::FromStr;
    ///
    /// // Simple name: "golang" gets parsed as "library/golang" by oci-spec
    /// let ref1 = Reference::from_str("golang:latest").unwrap();
    /// assert_eq!(ref1.repository_for_registry(false), "golang");
    /// assert_eq!(ref1.repository_for_registry(true), "library/golang");
    ///
    /// // Note: "library/myrepo" without additional slashes is indistinguishable
    /// // from auto-added prefix, so it gets stripped when dockerhub_compat=false
    /// let ref2 = Reference::from_str("library/myrepo:latest").unwrap();
    /// assert_eq!(ref2.repository_for_registry(false), "myrepo");
    ///
    /// // Organization repo: no prefix added
    /// let ref3 = Reference::from_str("myorg/repo:latest").unwrap();
    /// assert_eq!(ref3.repository_for_registry(false), "myorg/repo");
    /// ```
    pub fn repository_for_registry(&self, dockerhub_compat: bool) -> &str {
        let repo = self.0.repository();

        if !dockerhub_compat && repo.starts_with("library/") {
            let after_prefix = &repo[8..]; // Everything after "library/"

            // Only strip if it was auto-added (i.e., simple name with no more slashes)
            // "library/golang" → strip (auto-added for simple "golang")
            // "library/myrepo/sub" → keep (user explicitly provided "library/myrepo/sub")
            if !after_prefix.contains('/') {
                return after_prefix;
            }
        }

        repo
    }

    /// Returns the tag part of the reference, if present.
    ///
    /// # Examples
    ///
    /// ```
    /// use pmtlib::reference::Reference;
    /// use std::str::FromStr;
    ///
    /// let reference = Reference::from_str("ghcr.io/user/repo:latest").unwrap();
    /// assert_eq!(reference.tag(), Some("latest"));
    /// ```
    pub fn tag(&self) -> Option<&str> {
        self.0.tag()
    }

    /// Returns the digest part of the reference, if present.
    ///
    /// # Examples
    ///
    /// ```
    /// use pmtlib::reference::Reference;
    /// use std::str::FromStr;
    ///
    /// let reference = Reference::from_str("ghcr.io/user/repo@sha256:7173b809ca12ec5dee4506cd86be934c4596dd234ee82c0662eac04a8c2c71dc").unwrap();
    /// assert!(reference.digest().is_some());
    /// ```
    pub fn digest(&self) -> Option<&str> {
        self.0.digest()
    }

    /// Returns a reference to the underlying `oci_spec::distribution::Reference`.
    pub fn inner(&self) -> &OciReference {
        &self.0
    }
}

/// A parsed image reference split into the parts the registry facade and
/// cache need to address it: registry host, namespace (repository path
/// minus its last segment), repository (last path segment), tag and digest.
///
/// This mirrors the `namespace`/`repository` split oras-py's `Container`
/// exposes, which the cache key format is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    registry: String,
    namespace: String,
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl Container {
    /// Parses a container reference such as
    /// `quay.io/konflux-ci/tekton-catalog/task-foo:0.1-abcd@sha256:...`.
    pub fn parse(s: &str) -> Result<Self> {
        let reference = Reference::from_str(s)?;
        let repo_path = reference.repository();
        let (namespace, repository) = match repo_path.rsplit_once('/') {
            Some((ns, repo)) => (ns.to_string(), repo.to_string()),
            None => (String::new(), repo_path.to_string()),
        };
        Ok(Self {
            registry: reference.registry().to_string(),
            namespace,
            repository,
            tag: reference.tag().map(str::to_string),
            digest: reference.digest().map(str::to_string),
        })
    }

    /// Parses a bare repository reference with no tag or digest, such as a
    /// Renovate `depName` (`quay.io/konflux-ci/foo`).
    pub fn from_repo(dep_name: &str) -> Result<Self> {
        let (registry, path) = dep_name
            .split_once('/')
            .ok_or_else(|| MigrateError::bad_reference(format!("{} has no registry host", dep_name)))?;
        let (namespace, repository) = match path.rsplit_once('/') {
            Some((ns, repo)) => (ns.to_string(), repo.to_string()),
            None => (String::new(), path.to_string()),
        };
        Ok(Self {
            registry: registry.to_string(),
            namespace,
            repository,
            tag: None,
            digest: None,
        })
    }

    /// Returns a copy of this container pointed at `digest`.
    pub fn with_digest(&self, digest: impl Into<String>) -> Self {
        Self {
            digest: Some(digest.into()),
            ..self.clone()
        }
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// The full repository path as it appears in the reference, i.e.
    /// `namespace/repository`.
    pub fn api_prefix(&self) -> String {
        if self.namespace.is_empty() {
            self.repository.clone()
        } else {
            format!("{}/{}", self.namespace, self.repository)
        }
    }

    /// The cache-key component identifying this container, combining
    /// namespace and repository the way the registry facade's cache keys do.
    pub fn cache_namespace(&self) -> &str {
        &self.namespace
    }

    /// The registry `referrers` endpoint URL for this container's digest.
    pub fn referrers_url(&self) -> Result<String> {
        let digest = self
            .digest
            .as_ref()
            .ok_or_else(|| MigrateError::bad_reference("container has no digest to list referrers for"))?;
        Ok(format!(
            "{}/v2/{}/referrers/{}",
            self.registry,
            self.api_prefix(),
            digest
        ))
    }

    /// The manifest URL for a given digest (which may differ from this
    /// container's own digest, e.g. when following a referrer).
    pub fn manifest_url(&self, digest: &str) -> String {
        format!("{}/v2/{}/manifests/{}", self.registry, self.api_prefix(), digest)
    }

    /// The blob URL for a given digest.
    pub fn blob_url(&self, digest: &str) -> String {
        format!("{}/v2/{}/blobs/{}", self.registry, self.api_prefix(), digest)
    }

    /// The full `registry/namespace/repository[:tag]@digest` URI, including
    /// the tag alongside the digest when both are present.
    pub fn uri_with_tag(&self) -> String {
        let base = format!("{}/{}", self.registry, self.api_prefix());
        match (&self.tag, &self.digest) {
            (Some(tag), Some(digest)) => format!("{}:{}@{}", base, tag, digest),
            (Some(tag), None) => format!("{}:{}", base, tag),
            (None, Some(digest)) => format!("{}@{}", base, digest),
            (None, None) => base,
        }
    }
}
