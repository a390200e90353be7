//! pmtlib - Pipeline Migration Tool library
//!
//! Discovers and applies Tekton task bundle migration scripts. A Renovate
//! upgrade bumps a task bundle's pinned digest; this crate walks the tag
//! history between the old and new bundle on an OCI registry, finds any
//! migration scripts attached to intermediate releases, and runs them in
//! order against the pipeline definitions that reference the bundle.
//!
//! # Quick Start
//!
//! ```no_run
//! use pmtlib::{migrate, migrate::ResolverStrategy};
//! use pmtlib::cache::Cache;
//! use pmtlib::registry::RegistryClient;
//! use std::path::PathBuf;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Cache::new(PathBuf::from("/tmp/pmt-cache"))?;
//!     let registry = RegistryClient::new(cache, Duration::from_secs(30))?;
//!     let http = reqwest::Client::new();
//!
//!     let records = pmtlib::migrate::clean_upgrades("[]")?;
//!     migrate::migrate(&records, &registry, &http, "https", ResolverStrategy::Linked).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Main Types
//!
//! - [`migrate::TaskBundleUpgradesManager`] - Collects, resolves and applies a batch of upgrades
//! - [`migrate::TaskBundleUpgrade`] / [`migrate::UpgradeRecord`] - Core upgrade data model
//! - [`registry::RegistryClient`] - Cache-backed OCI registry facade
//! - [`reference::Container`] - Parsed `registry/namespace/repo[:tag][@digest]` reference
//! - [`cache::Cache`] - Content-addressed filesystem cache

#![warn(clippy::all)]

/// Returns the pmtlib crate version.
///
/// This is useful for version reporting in CLI tools and debugging.
///
/// # Examples
///
/// ```
/// let version = pmtlib::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// Re-export commonly used types for convenience
pub use config::Config;
pub use digest::Digest;
pub use error::{MigrateError, Result};
pub use migrate::{ResolverStrategy, TaskBundleUpgrade, UpgradeRecord};
pub use reference::Reference;

// Low-level implementation modules (hidden from docs but still public)
// These are available for advanced users who need fine-grained control
#[doc(hidden)]
pub mod cache;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod digest;
#[doc(hidden)]
pub mod error;
pub mod migrate;
#[doc(hidden)]
pub mod reference;
#[doc(hidden)]
pub mod registry;
pub mod yaml;
