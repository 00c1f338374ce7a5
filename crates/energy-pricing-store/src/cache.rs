//! Short-TTL configuration cache.
//!
//! [`CachedConfigStore`] wraps any [`ConfigStore`] and keeps lookups
//! (including negative ones) for a short TTL. Administration surfaces call
//! [`ConfigCache::invalidate`] after a change; until then readers may see
//! data up to one TTL old.
//!
//! Each map holds at most `capacity` entries. When a map is full, expired
//! entries are swept first; if it is still full the oldest half is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

use energy_pricing_core::{
    AgentId, BotId, OverrideTarget, PackageId, PackageInfo, PriceOverride, SystemLimits,
};

use crate::error::Result;
use crate::{ConfigCache, ConfigStore};

/// Default time-to-live for cached entries.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Default per-map entry cap.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// What to invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
    /// A package and every override on it.
    Package(PackageId),
    /// Every override owned by a bot.
    Bot(BotId),
    /// Every override owned by an agent.
    Agent(AgentId),
    /// The system limits.
    SystemLimits,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that went to the wrapped store.
    pub misses: u64,
    /// Entries currently held across the package and override maps.
    pub entries: u64,
}

#[derive(Debug, Clone)]
struct Cached<T> {
    value: T,
    stored_at: Instant,
}

impl<T: Clone> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.stored_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

/// A [`ConfigStore`] wrapper with per-entry TTL and explicit invalidation.
pub struct CachedConfigStore<S> {
    inner: S,
    ttl: Duration,
    capacity: usize,
    packages: DashMap<PackageId, Cached<Option<PackageInfo>>>,
    overrides: DashMap<(OverrideTarget, PackageId), Cached<Option<PriceOverride>>>,
    limits: RwLock<Option<Cached<SystemLimits>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: ConfigStore> CachedConfigStore<S> {
    /// Wrap a store with the default TTL.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    /// Wrap a store with a custom TTL.
    #[must_use]
    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            capacity: DEFAULT_CACHE_CAPACITY,
            packages: DashMap::new(),
            overrides: DashMap::new(),
            limits: RwLock::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cap the number of entries per map. A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// The wrapped store.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Current hit/miss counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: (self.packages.len() + self.overrides.len()) as u64,
        }
    }

    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn cached_package(&self, package_id: &PackageId) -> Option<Option<PackageInfo>> {
        let fresh = self
            .packages
            .get(package_id)
            .map(|entry| entry.fresh(self.ttl));
        match fresh {
            Some(None) => {
                self.packages.remove(package_id);
                None
            }
            Some(value) => value,
            None => None,
        }
    }

    fn cached_override(
        &self,
        key: &(OverrideTarget, PackageId),
    ) -> Option<Option<PriceOverride>> {
        let fresh = self.overrides.get(key).map(|entry| entry.fresh(self.ttl));
        match fresh {
            Some(None) => {
                self.overrides.remove(key);
                None
            }
            Some(value) => value,
            None => None,
        }
    }

    fn store_package(&self, package_id: PackageId, package: Option<PackageInfo>) {
        make_room(&self.packages, self.capacity, self.ttl);
        self.packages.insert(package_id, Cached::new(package));
    }

    fn store_override(&self, key: (OverrideTarget, PackageId), over: Option<PriceOverride>) {
        make_room(&self.overrides, self.capacity, self.ttl);
        self.overrides.insert(key, Cached::new(over));
    }
}

/// Keep `map` below `capacity` before an insert.
fn make_room<K, T>(map: &DashMap<K, Cached<T>>, capacity: usize, ttl: Duration)
where
    K: Eq + std::hash::Hash + Clone,
{
    if map.len() < capacity {
        return;
    }

    map.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    if map.len() < capacity {
        return;
    }

    let mut ages: Vec<(K, Instant)> = map
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().stored_at))
        .collect();
    ages.sort_by_key(|(_, stored_at)| *stored_at);
    let evict = (ages.len() / 2).max(1);
    for (key, _) in ages.into_iter().take(evict) {
        map.remove(&key);
    }
    tracing::debug!(evicted = evict, capacity, "Config cache full, evicted oldest entries");
}

impl<S: ConfigStore> ConfigStore for CachedConfigStore<S> {
    fn get_package(&self, package_id: &PackageId) -> Result<Option<PackageInfo>> {
        if let Some(cached) = self.cached_package(package_id) {
            self.hit();
            return Ok(cached);
        }

        self.miss();
        let package = self.inner.get_package(package_id)?;
        self.store_package(*package_id, package.clone());
        Ok(package)
    }

    fn get_packages(&self, package_ids: &[PackageId]) -> Result<HashMap<PackageId, PackageInfo>> {
        let mut found = HashMap::with_capacity(package_ids.len());
        let mut missing = Vec::new();

        for id in package_ids {
            match self.cached_package(id) {
                Some(cached) => {
                    self.hit();
                    if let Some(package) = cached {
                        found.insert(*id, package);
                    }
                }
                None => missing.push(*id),
            }
        }

        if !missing.is_empty() {
            self.misses.fetch_add(missing.len() as u64, Ordering::Relaxed);
            let fetched = self.inner.get_packages(&missing)?;
            for id in missing {
                let package = fetched.get(&id).cloned();
                self.store_package(id, package.clone());
                if let Some(package) = package {
                    found.insert(id, package);
                }
            }
        }

        Ok(found)
    }

    fn get_override(
        &self,
        target: &OverrideTarget,
        package_id: &PackageId,
    ) -> Result<Option<PriceOverride>> {
        let key = (*target, *package_id);
        if let Some(cached) = self.cached_override(&key) {
            self.hit();
            return Ok(cached);
        }

        self.miss();
        let over = self.inner.get_override(target, package_id)?;
        self.store_override(key, over.clone());
        Ok(over)
    }

    fn get_system_limits(&self) -> Result<SystemLimits> {
        let cached = self
            .limits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|c| c.fresh(self.ttl));
        if let Some(limits) = cached {
            self.hit();
            return Ok(limits);
        }

        self.miss();
        let limits = self.inner.get_system_limits()?;
        *self.limits.write().unwrap_or_else(PoisonError::into_inner) = Some(Cached::new(limits));
        Ok(limits)
    }
}

impl<S: ConfigStore> ConfigCache for CachedConfigStore<S> {
    fn invalidate(&self, key: CacheKey) {
        match key {
            CacheKey::Package(package_id) => {
                self.packages.remove(&package_id);
                self.overrides.retain(|(_, pkg), _| *pkg != package_id);
            }
            CacheKey::Bot(bot_id) => {
                self.overrides
                    .retain(|(target, _), _| *target != OverrideTarget::Bot(bot_id));
            }
            CacheKey::Agent(agent_id) => {
                self.overrides
                    .retain(|(target, _), _| *target != OverrideTarget::Agent(agent_id));
            }
            CacheKey::SystemLimits => {
                *self.limits.write().unwrap_or_else(PoisonError::into_inner) = None;
            }
        }
        tracing::debug!(?key, "Config cache invalidated");
    }

    fn invalidate_all(&self) {
        self.packages.clear();
        self.overrides.clear();
        *self.limits.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::debug!("Config cache cleared");
    }
}
