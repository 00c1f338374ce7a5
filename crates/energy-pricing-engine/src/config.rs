//! Engine configuration.
//!
//! Everything the engine would otherwise hard-code lives here and is passed
//! into [`crate::Calculator::new`]; there are no global constants to mutate.

use serde::{Deserialize, Serialize};

use energy_pricing_core::{PricingError, ResourceType, Result};

/// Default upper bound on `quantity`.
pub const DEFAULT_MAX_QUANTITY: u64 = 1_000_000;

/// Default upper bound on `amount`.
pub const DEFAULT_MAX_AMOUNT: f64 = 1e10;

/// Quantity above which callers are told to use batch pricing.
pub const DEFAULT_LARGE_QUANTITY: u64 = 1_000;

/// Default capacity of the history queue.
pub const DEFAULT_HISTORY_QUEUE_CAPACITY: usize = 1_024;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unit price for energy requests that resolve to no package.
    pub fallback_energy_price: Option<f64>,
    /// Unit price for bandwidth requests that resolve to no package.
    pub fallback_bandwidth_price: Option<f64>,
    /// Largest accepted quantity.
    pub max_quantity: u64,
    /// Largest accepted resource amount.
    pub max_amount: f64,
    /// Quantity above which a batching suggestion is emitted.
    pub large_quantity: u64,
    /// Capacity of the history recorder queue.
    pub history_queue_capacity: usize,
    /// Batch worker count (`None` = available parallelism).
    pub batch_workers: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_energy_price: None,
            fallback_bandwidth_price: None,
            max_quantity: DEFAULT_MAX_QUANTITY,
            max_amount: DEFAULT_MAX_AMOUNT,
            large_quantity: DEFAULT_LARGE_QUANTITY,
            history_queue_capacity: DEFAULT_HISTORY_QUEUE_CAPACITY,
            batch_workers: None,
        }
    }
}

impl EngineConfig {
    /// Set the system fallback price for a resource.
    #[must_use]
    pub fn with_fallback_price(mut self, resource_type: ResourceType, price: f64) -> Self {
        match resource_type {
            ResourceType::Energy => self.fallback_energy_price = Some(price),
            ResourceType::Bandwidth => self.fallback_bandwidth_price = Some(price),
        }
        self
    }

    /// Set the upper bound on quantity.
    #[must_use]
    pub fn with_max_quantity(mut self, max_quantity: u64) -> Self {
        self.max_quantity = max_quantity;
        self
    }

    /// Set the upper bound on amount.
    #[must_use]
    pub fn with_max_amount(mut self, max_amount: f64) -> Self {
        self.max_amount = max_amount;
        self
    }

    /// Set the history queue capacity.
    #[must_use]
    pub fn with_history_queue_capacity(mut self, capacity: usize) -> Self {
        self.history_queue_capacity = capacity;
        self
    }

    /// Set the batch worker count.
    #[must_use]
    pub fn with_batch_workers(mut self, workers: usize) -> Self {
        self.batch_workers = Some(workers);
        self
    }

    /// System fallback price for a resource, if configured.
    #[must_use]
    pub const fn fallback_price(&self, resource_type: ResourceType) -> Option<f64> {
        match resource_type {
            ResourceType::Energy => self.fallback_energy_price,
            ResourceType::Bandwidth => self.fallback_bandwidth_price,
        }
    }

    /// Number of batch workers to spawn.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.batch_workers
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, usize::from))
            .max(1)
    }

    /// Check the configuration for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Configuration` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        for resource_type in [ResourceType::Energy, ResourceType::Bandwidth] {
            if let Some(price) = self.fallback_price(resource_type) {
                if !price.is_finite() || price <= 0.0 {
                    return Err(PricingError::Configuration(format!(
                        "fallback {resource_type} price must be positive, got {price}"
                    )));
                }
            }
        }
        if self.max_quantity == 0 {
            return Err(PricingError::Configuration(
                "max_quantity must be positive".into(),
            ));
        }
        if !self.max_amount.is_finite() || self.max_amount <= 0.0 {
            return Err(PricingError::Configuration(
                "max_amount must be positive".into(),
            ));
        }
        if self.history_queue_capacity == 0 {
            return Err(PricingError::Configuration(
                "history_queue_capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fallback_price(ResourceType::Energy), None);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn fallback_price_must_be_positive() {
        let config = EngineConfig::default().with_fallback_price(ResourceType::Bandwidth, 0.0);
        assert!(matches!(
            config.validate(),
            Err(PricingError::Configuration(_))
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"fallback_energy_price": 2.5}"#).unwrap();
        assert_eq!(config.fallback_price(ResourceType::Energy), Some(2.5));
        assert_eq!(config.max_quantity, DEFAULT_MAX_QUANTITY);
    }
}
