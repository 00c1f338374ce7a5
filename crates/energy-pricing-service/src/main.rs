//! Energy Pricing Service - HTTP API for energy and bandwidth pricing
//!
//! This is the main entry point for the energy-pricing service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use energy_pricing_service::{create_router, AppState, PricingStore, ServiceConfig};
use energy_pricing_store::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,energy_pricing=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Energy Pricing Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = ?config.data_dir,
        seed_file = ?config.seed_file,
        fallback_energy_price = ?config.engine.fallback_energy_price,
        fallback_bandwidth_price = ?config.engine.fallback_bandwidth_price,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;

    // Build app state
    let state = AppState::new(store, config.clone())?;

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the configured storage backend.
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn PricingStore>, Box<dyn std::error::Error>> {
    #[cfg(feature = "rocksdb-backend")]
    {
        if let Some(data_dir) = &config.data_dir {
            tracing::info!(path = %data_dir, "Opening RocksDB store");
            return Ok(Arc::new(energy_pricing_store::RocksStore::open(data_dir)?));
        }
    }

    #[cfg(not(feature = "rocksdb-backend"))]
    {
        if config.data_dir.is_some() {
            tracing::warn!("DATA_DIR is set but the rocksdb-backend feature is disabled");
        }
    }

    match &config.seed_file {
        Some(path) => {
            tracing::info!(path = %path, "Seeding in-memory store");
            Ok(Arc::new(MemoryStore::load_seed_file(path)?))
        }
        None => {
            tracing::warn!("No SEED_FILE configured, starting with an empty catalog");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
