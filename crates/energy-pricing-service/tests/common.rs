//! Common test utilities for energy-pricing integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestServer;

use energy_pricing_core::{PackageInfo, QuantityTier, ResourceType};
use energy_pricing_engine::{EngineConfig, NetworkLoad};
use energy_pricing_service::{create_router, AppState, NetworkMode, ServiceConfig};
use energy_pricing_store::{ConfigWriter, MemoryStore};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The backing store, for seeding and direct inspection.
    pub store: Arc<MemoryStore>,
    /// Energy package at 1.5 per unit.
    pub energy: PackageInfo,
    /// Energy package at 1.0 per unit with quantity tiers.
    pub tiered: PackageInfo,
    /// Bandwidth package at 0.5 per unit.
    pub bandwidth: PackageInfo,
}

impl TestHarness {
    /// Create a new test harness with a seeded in-memory catalog.
    ///
    /// Network load is pinned to medium so prices don't depend on the clock.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a harness with a custom configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(MemoryStore::new());

        let energy = PackageInfo::new("Energy 32k", ResourceType::Energy, 1.5);
        let tiered = PackageInfo::new("Energy tiered", ResourceType::Energy, 1.0)
            .with_tiers(vec![QuantityTier::new(50, 5.0), QuantityTier::new(100, 10.0)]);
        let bandwidth = PackageInfo::new("Bandwidth 1k", ResourceType::Bandwidth, 0.5);
        for package in [&energy, &tiered, &bandwidth] {
            store.put_package(package).expect("Failed to seed package");
        }

        let state = AppState::new(store.clone(), config).expect("Failed to build app state");
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            energy,
            tiered,
            bandwidth,
        }
    }

    /// Give the history worker a moment to drain its queue.
    pub async fn settle_history(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Service configuration used by the tests.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        network: NetworkMode::Static(NetworkLoad::Medium),
        cache_ttl_seconds: 60,
        max_batch_size: 10,
        engine: EngineConfig::default().with_fallback_price(ResourceType::Energy, 2.0),
        ..ServiceConfig::default()
    }
}
