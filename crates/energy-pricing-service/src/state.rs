//! Application state.

use std::sync::Arc;
use std::time::Duration;

use energy_pricing_core::PricingError;
use energy_pricing_engine::{
    Calculator, HistoryRecorder, HourlyNetworkStatus, NetworkStatusProvider, StaticNetworkStatus,
};
use energy_pricing_store::{
    CacheKey, CachedConfigStore, ConfigCache, ConfigWriter, HistorySink,
};

use crate::config::{NetworkMode, ServiceConfig};

/// Storage backend the service runs on: configuration plus history.
pub trait PricingStore: ConfigWriter + HistorySink {}

impl<T: ConfigWriter + HistorySink> PricingStore for T {}

/// Read-through cache over the backend.
pub type ConfigCacheStore = CachedConfigStore<Arc<dyn PricingStore>>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The pricing engine, reading through the cache.
    pub calculator: Calculator,

    /// The storage backend (writes and history queries).
    pub store: Arc<dyn PricingStore>,

    /// The config cache the calculator reads through.
    pub cache: Arc<ConfigCacheStore>,

    /// Audit trail for admin changes.
    pub recorder: HistoryRecorder,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state and start the history worker.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Configuration` if the engine config is invalid.
    pub fn new(store: Arc<dyn PricingStore>, config: ServiceConfig) -> Result<Self, PricingError> {
        let cache = Arc::new(CachedConfigStore::with_ttl(
            Arc::clone(&store),
            Duration::from_secs(config.cache_ttl_seconds),
        )
        .with_capacity(config.cache_capacity));

        let network: Arc<dyn NetworkStatusProvider> = match config.network {
            NetworkMode::Hourly => Arc::new(HourlyNetworkStatus::default()),
            NetworkMode::Static(load) => Arc::new(StaticNetworkStatus(load)),
        };

        let sink: Arc<dyn HistorySink> = Arc::new(Arc::clone(&store));
        let (recorder, _worker) =
            HistoryRecorder::spawn(sink, config.engine.history_queue_capacity);

        let calculator = Calculator::new(cache.clone(), network, &config.engine)?
            .with_history(recorder.clone());

        tracing::info!(
            cache_ttl_seconds = config.cache_ttl_seconds,
            cache_capacity = config.cache_capacity,
            network = ?config.network,
            "Pricing engine initialised"
        );

        Ok(Self {
            calculator,
            store,
            cache,
            recorder,
            config,
        })
    }

    /// Drop cached configuration for a changed record.
    pub fn invalidate(&self, key: CacheKey) {
        self.cache.invalidate(key);
    }
}
