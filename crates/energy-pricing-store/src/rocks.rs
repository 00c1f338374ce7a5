//! `RocksDB` storage implementation.
//!
//! [`RocksStore`] persists packages, overrides, system limits and price
//! history in separate column families. Values are CBOR-encoded.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options,
};

use energy_pricing_core::{
    EntityType, OverrideTarget, PackageId, PackageInfo, PriceHistoryEntry, PriceOverride,
    SystemLimits,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{ConfigStore, ConfigWriter, HistorySink};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put<T: serde::Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let value = Self::serialize(value)?;
        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Every history entry for an entity, oldest first.
    fn history_for(&self, entity_type: EntityType, entity_id: &str) -> Result<Vec<PriceHistoryEntry>> {
        let cf = self.cf(cf::PRICE_HISTORY)?;
        let prefix = keys::history_prefix(entity_type, entity_id);

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            entries.push(Self::deserialize(&value)?);
        }

        Ok(entries)
    }
}

impl ConfigStore for RocksStore {
    fn get_package(&self, package_id: &PackageId) -> Result<Option<PackageInfo>> {
        self.get(cf::PACKAGES, &keys::package_key(package_id))
    }

    fn get_packages(&self, package_ids: &[PackageId]) -> Result<HashMap<PackageId, PackageInfo>> {
        let cf = self.cf(cf::PACKAGES)?;
        let results = self.db.multi_get_cf(
            package_ids
                .iter()
                .map(|id| (&cf, keys::package_key(id))),
        );

        let mut found = HashMap::with_capacity(package_ids.len());
        for (id, result) in package_ids.iter().zip(results) {
            if let Some(data) = result.map_err(|e| StoreError::Database(e.to_string()))? {
                found.insert(*id, Self::deserialize(&data)?);
            }
        }

        Ok(found)
    }

    fn get_override(
        &self,
        target: &OverrideTarget,
        package_id: &PackageId,
    ) -> Result<Option<PriceOverride>> {
        self.get(cf::OVERRIDES, &keys::override_key(target, package_id))
    }

    fn get_system_limits(&self) -> Result<SystemLimits> {
        Ok(self
            .get(cf::SYSTEM, keys::SYSTEM_LIMITS_KEY)?
            .unwrap_or_default())
    }
}

impl ConfigWriter for RocksStore {
    fn put_package(&self, package: &PackageInfo) -> Result<()> {
        self.put(cf::PACKAGES, &keys::package_key(&package.id), package)
    }

    fn put_override(&self, over: &PriceOverride) -> Result<()> {
        self.put(
            cf::OVERRIDES,
            &keys::override_key(&over.target, &over.package_id),
            over,
        )
    }

    fn put_system_limits(&self, limits: &SystemLimits) -> Result<()> {
        self.put(cf::SYSTEM, keys::SYSTEM_LIMITS_KEY, limits)
    }
}

impl HistorySink for RocksStore {
    fn append(&self, entry: &PriceHistoryEntry) -> Result<()> {
        let key = keys::history_key(entry.entity_type, &entry.entity_id, &entry.id);
        self.put(cf::PRICE_HISTORY, &key, entry)
    }

    fn latest_price(&self, entity_type: EntityType, entity_id: &str) -> Result<Option<f64>> {
        Ok(self
            .history_for(entity_type, entity_id)?
            .last()
            .map(|e| e.new_price))
    }

    fn list(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        limit: usize,
    ) -> Result<Vec<PriceHistoryEntry>> {
        let mut entries = self.history_for(entity_type, entity_id)?;

        // Reverse to get newest first
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}
