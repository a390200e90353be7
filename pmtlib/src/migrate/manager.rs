//! Deduplicates and groups raw upgrade records, then drives resolution and
//! application across every package file they touch.

use crate::error::Result;
use crate::migrate::apply::apply_to_package_file;
use crate::migrate::resolver::{resolve, ResolverStrategy};
use crate::migrate::types::{PackageFile, TaskBundleUpgrade, UpgradeRecord};
use crate::registry::RegistryClient;
use std::collections::HashMap;
use std::path::Path;


/// Owns the deduplicated set of task bundle upgrades (keyed by
/// [`TaskBundleUpgrade::current_bundle`]) and the package files that
/// reference them, built from a batch of raw Renovate upgrade records.
pub struct TaskBundleUpgradesManager {
    upgrades: HashMap<String, TaskBundleUpgrade>,
    package_files: HashMap<String, PackageFile>,
    package_file_order: Vec<String>,
}

impl TaskBundleUpgradesManager {
    pub fn new(records: &[UpgradeRecord]) -> Self {
        let mut manager = Self {
            upgrades: HashMap::new(),
            package_files: HashMap::new(),
            package_file_order: Vec::new(),
        };
        manager.collect(records);
        manager
    }

    fn collect(&mut self, records: &[UpgradeRecord]) {
        for record in records {
            let upgrade = TaskBundleUpgrade::new(record);
            let key = upgrade.current_bundle();
            self.upgrades.entry(key.clone()).or_insert(upgrade);

            if !self.package_files.contains_key(&record.package_file) {
                self.package_file_order.push(record.package_file.clone());
                self.package_files.insert(
                    record.package_file.clone(),
                    PackageFile {
                        file_path: record.package_file.clone(),
                        parent_dir: record.parent_dir.clone(),
                        upgrade_keys: Vec::new(),
                    },
                );
            }

            let package_file = self.package_files.get_mut(&record.package_file).expect("just inserted above");
            if !package_file.upgrade_keys.contains(&key) {
                package_file.upgrade_keys.push(key);
            }
        }
    }

    /// Package files in first-seen order, each naming the upgrade keys that apply to it.
    pub fn package_files(&self) -> Vec<&PackageFile> {
        self.package_file_order
            .iter()
            .map(|path| &self.package_files[path])
            .collect()
    }

    /// Resolves migrations for every distinct upgrade concurrently.
    pub async fn resolve_migrations(
        &mut self,
        registry: &RegistryClient,
        http: &reqwest::Client,
        scheme: &str,
        strategy: ResolverStrategy,
    ) -> Result<()> {
        let keys: Vec<String> = self.upgrades.keys().cloned().collect();
        let mut batch: Vec<TaskBundleUpgrade> = keys.iter().map(|key| self.upgrades[key].clone()).collect();

        resolve(registry, http, scheme, strategy, &mut batch).await?;

        for (key, upgrade) in keys.into_iter().zip(batch) {
            self.upgrades.insert(key, upgrade);
        }
        Ok(())
    }

    /// Applies every package file's migrations in sequence. Files are
    /// handled one at a time, in first-seen order; within each file,
    /// migrations run in the order established by `resolve_migrations`.
    pub async fn apply_migrations(&self) -> Result<()> {
        for package_file in self.package_files() {
            let upgrades: Vec<TaskBundleUpgrade> = package_file
                .upgrade_keys
                .iter()
                .filter_map(|key| self.upgrades.get(key))
                .cloned()
                .collect();
            apply_to_package_file(Path::new(&package_file.file_path), &upgrades).await?;
        }
        Ok(())
    }
}
