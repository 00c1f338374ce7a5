//! In-memory storage implementation.
//!
//! [`MemoryStore`] implements every storage contract on plain maps behind
//! `RwLock`s. It backs tests and small deployments, and can be seeded from a
//! JSON catalog file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use energy_pricing_core::{
    EntityType, OverrideTarget, PackageId, PackageInfo, PriceHistoryEntry, PriceOverride,
    SystemLimits,
};

use crate::error::{Result, StoreError};
use crate::{ConfigStore, ConfigWriter, HistorySink};

/// Initial catalog contents, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    /// Catalog packages.
    #[serde(default)]
    pub packages: Vec<PackageInfo>,
    /// Bot and agent overrides.
    #[serde(default)]
    pub overrides: Vec<PriceOverride>,
    /// System limits (defaults when absent).
    #[serde(default)]
    pub limits: Option<SystemLimits>,
}

/// Map-backed storage implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    packages: RwLock<HashMap<PackageId, PackageInfo>>,
    overrides: RwLock<HashMap<(OverrideTarget, PackageId), PriceOverride>>,
    limits: RwLock<SystemLimits>,
    history: RwLock<Vec<PriceHistoryEntry>>,
}

impl MemoryStore {
    /// Create an empty store with default system limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from a seed.
    #[must_use]
    pub fn from_seed(seed: CatalogSeed) -> Self {
        let packages = seed.packages.into_iter().map(|p| (p.id, p)).collect();
        let overrides = seed
            .overrides
            .into_iter()
            .map(|o| ((o.target, o.package_id), o))
            .collect();

        Self {
            packages: RwLock::new(packages),
            overrides: RwLock::new(overrides),
            limits: RwLock::new(seed.limits.unwrap_or_default()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Load a seed from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_seed_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| StoreError::Database(format!("failed to read seed file: {e}")))?;
        let seed: CatalogSeed = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Serialization(format!("invalid seed file: {e}")))?;

        tracing::info!(
            path = %path.as_ref().display(),
            packages = seed.packages.len(),
            overrides = seed.overrides.len(),
            "Loaded catalog seed"
        );

        Ok(Self::from_seed(seed))
    }

    /// Number of history entries held.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn history_len(&self) -> Result<usize> {
        Ok(read(&self.history)?.len())
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::Database("lock poisoned".into()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::Database("lock poisoned".into()))
}

impl ConfigStore for MemoryStore {
    fn get_package(&self, package_id: &PackageId) -> Result<Option<PackageInfo>> {
        Ok(read(&self.packages)?.get(package_id).cloned())
    }

    fn get_packages(&self, package_ids: &[PackageId]) -> Result<HashMap<PackageId, PackageInfo>> {
        let packages = read(&self.packages)?;
        Ok(package_ids
            .iter()
            .filter_map(|id| packages.get(id).map(|p| (*id, p.clone())))
            .collect())
    }

    fn get_override(
        &self,
        target: &OverrideTarget,
        package_id: &PackageId,
    ) -> Result<Option<PriceOverride>> {
        Ok(read(&self.overrides)?
            .get(&(*target, *package_id))
            .cloned())
    }

    fn get_system_limits(&self) -> Result<SystemLimits> {
        Ok(*read(&self.limits)?)
    }
}

impl ConfigWriter for MemoryStore {
    fn put_package(&self, package: &PackageInfo) -> Result<()> {
        write(&self.packages)?.insert(package.id, package.clone());
        Ok(())
    }

    fn put_override(&self, over: &PriceOverride) -> Result<()> {
        write(&self.overrides)?.insert((over.target, over.package_id), over.clone());
        Ok(())
    }

    fn put_system_limits(&self, limits: &SystemLimits) -> Result<()> {
        *write(&self.limits)? = *limits;
        Ok(())
    }
}

impl HistorySink for MemoryStore {
    fn append(&self, entry: &PriceHistoryEntry) -> Result<()> {
        write(&self.history)?.push(entry.clone());
        Ok(())
    }

    fn latest_price(&self, entity_type: EntityType, entity_id: &str) -> Result<Option<f64>> {
        Ok(read(&self.history)?
            .iter()
            .rev()
            .find(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .map(|e| e.new_price))
    }

    fn list(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        limit: usize,
    ) -> Result<Vec<PriceHistoryEntry>> {
        Ok(read(&self.history)?
            .iter()
            .rev()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
