//! Storage layer for the pricing engine.
//!
//! This crate defines the collaborator contracts the engine reads through
//! and the backends that implement them:
//!
//! - [`ConfigStore`]: read-only lookups of packages, overrides and system limits
//! - [`ConfigWriter`]: writes and typed patches, used by administration surfaces
//! - [`HistorySink`]: append-only price history
//! - [`ConfigCache`]: explicit invalidation of cached configuration
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process maps, seedable from a JSON catalog file
//! - `RocksStore` (feature `rocksdb-backend`): column families for packages,
//!   overrides, system limits and price history, values encoded as CBOR
//! - [`CachedConfigStore`]: TTL cache wrapping any [`ConfigStore`]
//!
//! # Example
//!
//! ```
//! use energy_pricing_core::{PackageInfo, ResourceType};
//! use energy_pricing_store::{ConfigStore, ConfigWriter, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let package = PackageInfo::new("Energy 65k", ResourceType::Energy, 1.5);
//! store.put_package(&package).unwrap();
//!
//! let found = store.get_package(&package.id).unwrap();
//! assert_eq!(found.unwrap().base_price, 1.5);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod error;
pub mod memory;
pub mod patch;

#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

use std::collections::HashMap;
use std::sync::Arc;

pub use cache::{
    CacheKey, CacheStats, CachedConfigStore, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL,
};
pub use error::{Result, StoreError};
pub use memory::{CatalogSeed, MemoryStore};
pub use patch::{OverridePatch, PackagePatch, PatchOutcome};
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use energy_pricing_core::{
    EntityType, OverrideTarget, PackageId, PackageInfo, PriceHistoryEntry, PriceOverride,
    SystemLimits,
};

/// Read-only access to pricing configuration.
///
/// This is the only way the engine reads configuration. Implementations may
/// serve slightly stale data (e.g. through [`CachedConfigStore`]).
pub trait ConfigStore: Send + Sync {
    /// Get a package by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get_package(&self, package_id: &PackageId) -> Result<Option<PackageInfo>>;

    /// Get several packages in one round trip.
    ///
    /// Missing packages are absent from the returned map. The default
    /// implementation loops over [`ConfigStore::get_package`].
    ///
    /// # Errors
    ///
    /// Returns an error if any lookup fails.
    fn get_packages(&self, package_ids: &[PackageId]) -> Result<HashMap<PackageId, PackageInfo>> {
        let mut found = HashMap::with_capacity(package_ids.len());
        for id in package_ids {
            if let Some(package) = self.get_package(id)? {
                found.insert(*id, package);
            }
        }
        Ok(found)
    }

    /// Get the override a bot or agent has for a package.
    ///
    /// Inactive overrides are returned as stored; callers decide how to treat them.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get_override(
        &self,
        target: &OverrideTarget,
        package_id: &PackageId,
    ) -> Result<Option<PriceOverride>>;

    /// Get the system-wide limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get_system_limits(&self) -> Result<SystemLimits>;
}

impl<T: ConfigStore + ?Sized> ConfigStore for Arc<T> {
    fn get_package(&self, package_id: &PackageId) -> Result<Option<PackageInfo>> {
        (**self).get_package(package_id)
    }

    fn get_packages(&self, package_ids: &[PackageId]) -> Result<HashMap<PackageId, PackageInfo>> {
        (**self).get_packages(package_ids)
    }

    fn get_override(
        &self,
        target: &OverrideTarget,
        package_id: &PackageId,
    ) -> Result<Option<PriceOverride>> {
        (**self).get_override(target, package_id)
    }

    fn get_system_limits(&self) -> Result<SystemLimits> {
        (**self).get_system_limits()
    }
}

/// Write access to pricing configuration.
pub trait ConfigWriter: ConfigStore {
    /// Insert or replace a package.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put_package(&self, package: &PackageInfo) -> Result<()>;

    /// Insert or replace an override.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put_override(&self, over: &PriceOverride) -> Result<()>;

    /// Replace the system limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put_system_limits(&self, limits: &SystemLimits) -> Result<()>;

    /// Apply a typed patch to a package.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the package doesn't exist.
    fn apply_package_patch(
        &self,
        package_id: &PackageId,
        patch: &PackagePatch,
    ) -> Result<PatchOutcome<PackageInfo>> {
        let before = self
            .get_package(package_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "package",
                id: package_id.to_string(),
            })?;

        let mut after = before.clone();
        let changed = patch.apply(&mut after);
        if !changed.is_empty() {
            self.put_package(&after)?;
        }

        Ok(PatchOutcome {
            before: Some(before),
            after,
            changed,
        })
    }

    /// Apply a typed patch to an override, creating it if the patch sets a
    /// unit price.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the override doesn't exist and the patch
    ///   has no unit price.
    fn apply_override_patch(
        &self,
        target: &OverrideTarget,
        package_id: &PackageId,
        patch: &OverridePatch,
    ) -> Result<PatchOutcome<PriceOverride>> {
        let before = self.get_override(target, package_id)?;

        let mut after = match (&before, patch.unit_price) {
            (Some(existing), _) => existing.clone(),
            (None, Some(price)) => PriceOverride::new(*target, *package_id, price),
            (None, None) => {
                return Err(StoreError::NotFound {
                    entity: "override",
                    id: format!("{target:?}/{package_id}"),
                })
            }
        };

        let changed = patch.apply(&mut after);
        if !changed.is_empty() {
            self.put_override(&after)?;
        }

        Ok(PatchOutcome {
            before,
            after,
            changed,
        })
    }
}

/// Append-only price history persistence.
pub trait HistorySink: Send + Sync {
    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn append(&self, entry: &PriceHistoryEntry) -> Result<()>;

    /// Most recently recorded price for an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn latest_price(&self, entity_type: EntityType, entity_id: &str) -> Result<Option<f64>>;

    /// Entries for an entity, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn list(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        limit: usize,
    ) -> Result<Vec<PriceHistoryEntry>>;
}

impl<T: HistorySink + ?Sized> HistorySink for Arc<T> {
    fn append(&self, entry: &PriceHistoryEntry) -> Result<()> {
        (**self).append(entry)
    }

    fn latest_price(&self, entity_type: EntityType, entity_id: &str) -> Result<Option<f64>> {
        (**self).latest_price(entity_type, entity_id)
    }

    fn list(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        limit: usize,
    ) -> Result<Vec<PriceHistoryEntry>> {
        (**self).list(entity_type, entity_id, limit)
    }
}

/// Explicit invalidation of cached configuration.
///
/// Called by administration surfaces after a change; the engine never calls it.
pub trait ConfigCache: Send + Sync {
    /// Drop cached data related to one entity.
    fn invalidate(&self, key: CacheKey);

    /// Drop everything.
    fn invalidate_all(&self);
}
