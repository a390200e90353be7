//! Content-addressed, file-backed cache.
//!
//! Every value stored here is a pure function of its key (a manifest, blob
//! or referrers listing keyed by registry/repo/digest), so the cache never
//! needs an eviction policy: a racing write of the same key always writes
//! the same bytes, making last-writer-wins safe under concurrent access.

use crate::error::{MigrateError, Result};
use sha2::{Digest as _, Sha256};
use std::path::PathBuf;


/// A filesystem-directory-backed key/value cache.
///
/// Cloning is cheap: `Cache` only holds the root path, so every worker in
/// the resolution pool can own its own handle to the same on-disk store.
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    /// Creates a cache rooted at `root`, creating the directory if needed.
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root).map_err(|e| {
            MigrateError::io_with_source(
                format!("failed to create cache directory {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Retrieves the raw bytes stored under `key`, if present.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_to_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path).map_err(|e| {
            MigrateError::io_with_source(format!("failed to read cache file {}", path.display()), e)
        })?;
        Ok(Some(bytes))
    }

    /// Stores `value` under `key`, overwriting any existing entry.
    ///
    /// Writes go through a temp file in the same directory followed by a
    /// rename, so concurrent writers never observe a partially-written file.
    pub fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.key_to_path(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MigrateError::io_with_source(
                    format!("failed to create cache directory {}", parent.display()),
                    e,
                )
            })?;
        }

        let tmp_path = path.with_extension(format!("tmp-{}", std::process::id()));
        std::fs::write(&tmp_path, value).map_err(|e| {
            MigrateError::io_with_source(
                format!("failed to write cache file {}", tmp_path.display()),
                e,
            )
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| {
            MigrateError::io_with_source(
                format!("failed to finalize cache file {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }

    /// Retrieves a UTF-8 string entry.
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key)? {
            Some(bytes) => {
                let s = String::from_utf8(bytes).map_err(|e| {
                    MigrateError::validation_with_source(
                        "cached value is not valid UTF-8",
                        e,
                    )
                })?;
                Ok(Some(s))
            }
            None => Ok(None),
        }
    }

    /// Stores a UTF-8 string entry.
    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, value.as_bytes())
    }

    /// Converts a cache key into a filesystem path, rejecting traversal.
    ///
    /// Keys in this crate are always `kind-namespace-repo-digest` strings
    /// built from registry-controlled components, but a hashed file name
    /// keeps the on-disk layout flat and avoids any possibility of a key
    /// containing a path separator reaching the filesystem layer.
    fn key_to_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(MigrateError::validation("cache key must not be empty"));
        }
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let digest = hasher.finalize();
        let file_name = hex_encode(&digest);
        Ok(self.root.join(file_name))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(s, "{:02x}", byte).expect("writing to a String never fails");
    }
    s
}

/// Builds the cache key for a manifest lookup.
pub fn manifest_key(namespace: &str, repo: &str, digest: &str) -> String {
    format!("manifest-{}-{}-{}", namespace, repo, digest)
}

/// Builds the cache key for a blob lookup.
pub fn blob_key(namespace: &str, repo: &str, digest: &str) -> String {
    format!("blob-{}-{}-{}", namespace, repo, digest)
}

/// Builds the cache key for a referrers listing.
pub fn referrers_key(namespace: &str, repo: &str, digest: &str) -> String {
    format!("referrers-{}-{}-{}", namespace, repo, digest)
}
