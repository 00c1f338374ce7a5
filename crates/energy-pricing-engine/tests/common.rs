//! Common test utilities for engine integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use energy_pricing_core::{
    OverrideTarget, PackageId, PackageInfo, PriceOverride, QuantityTier, ResourceType,
    SystemLimits,
};
use energy_pricing_engine::{Calculator, EngineConfig, NetworkLoad, StaticNetworkStatus};
use energy_pricing_store::{ConfigStore, ConfigWriter, MemoryStore, StoreError};
use tokio_util::sync::CancellationToken;

/// A store whose bulk package lookup always fails.
pub struct FailingBulkStore {
    pub inner: MemoryStore,
    pub bulk_calls: AtomicUsize,
}

impl FailingBulkStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            bulk_calls: AtomicUsize::new(0),
        }
    }
}

impl ConfigStore for FailingBulkStore {
    fn get_package(&self, package_id: &PackageId) -> energy_pricing_store::Result<Option<PackageInfo>> {
        self.inner.get_package(package_id)
    }

    fn get_packages(
        &self,
        _package_ids: &[PackageId],
    ) -> energy_pricing_store::Result<HashMap<PackageId, PackageInfo>> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("bulk read timed out".into()))
    }

    fn get_override(
        &self,
        target: &OverrideTarget,
        package_id: &PackageId,
    ) -> energy_pricing_store::Result<Option<PriceOverride>> {
        self.inner.get_override(target, package_id)
    }

    fn get_system_limits(&self) -> energy_pricing_store::Result<SystemLimits> {
        self.inner.get_system_limits()
    }
}

/// A store whose bulk lookup fails and which fires `cancel` on the
/// `cancel_after`-th single package read. Each single read blocks for
/// `read_delay`.
pub struct CancellingStore {
    pub inner: FailingBulkStore,
    pub cancel: CancellationToken,
    pub cancel_after: usize,
    pub read_delay: Duration,
    pub package_reads: AtomicUsize,
}

impl CancellingStore {
    pub fn new(inner: MemoryStore, cancel: CancellationToken, cancel_after: usize) -> Self {
        Self {
            inner: FailingBulkStore::new(inner),
            cancel,
            cancel_after,
            read_delay: Duration::ZERO,
            package_reads: AtomicUsize::new(0),
        }
    }

    pub fn with_read_delay(mut self, read_delay: Duration) -> Self {
        self.read_delay = read_delay;
        self
    }
}

impl ConfigStore for CancellingStore {
    fn get_package(&self, package_id: &PackageId) -> energy_pricing_store::Result<Option<PackageInfo>> {
        let reads = self.package_reads.fetch_add(1, Ordering::SeqCst) + 1;
        if reads == self.cancel_after {
            self.cancel.cancel();
        }
        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay);
        }
        self.inner.get_package(package_id)
    }

    fn get_packages(
        &self,
        package_ids: &[PackageId],
    ) -> energy_pricing_store::Result<HashMap<PackageId, PackageInfo>> {
        self.inner.get_packages(package_ids)
    }

    fn get_override(
        &self,
        target: &OverrideTarget,
        package_id: &PackageId,
    ) -> energy_pricing_store::Result<Option<PriceOverride>> {
        self.inner.get_override(target, package_id)
    }

    fn get_system_limits(&self) -> energy_pricing_store::Result<SystemLimits> {
        self.inner.get_system_limits()
    }
}

/// Catalog used by most tests.
pub struct Catalog {
    pub store: Arc<MemoryStore>,
    /// Energy package at 1.5 with no tiers.
    pub energy: PackageInfo,
    /// Energy package at 1.0 with tiers {100: 10%, 50: 5%}.
    pub tiered: PackageInfo,
    /// Bandwidth package at 0.5.
    pub bandwidth: PackageInfo,
}

impl Catalog {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());

        let energy = PackageInfo::new("Energy 32k", ResourceType::Energy, 1.5);
        let tiered = PackageInfo::new("Energy bulk", ResourceType::Energy, 1.0).with_tiers(vec![
            QuantityTier::new(100, 10.0),
            QuantityTier::new(50, 5.0),
        ]);
        let bandwidth = PackageInfo::new("Bandwidth", ResourceType::Bandwidth, 0.5);

        for package in [&energy, &tiered, &bandwidth] {
            store.put_package(package).unwrap();
        }

        Self {
            store,
            energy,
            tiered,
            bandwidth,
        }
    }

    pub fn calculator(&self) -> Calculator {
        self.calculator_with(EngineConfig::default(), NetworkLoad::Medium)
    }

    pub fn calculator_with(&self, config: EngineConfig, load: NetworkLoad) -> Calculator {
        Calculator::new(
            self.store.clone(),
            Arc::new(StaticNetworkStatus(load)),
            &config,
        )
        .unwrap()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
