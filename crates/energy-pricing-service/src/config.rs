//! Service configuration.

use std::path::Path;
use std::str::FromStr;

use energy_pricing_core::ResourceType;
use energy_pricing_engine::{EngineConfig, NetworkLoad};
use energy_pricing_store::DEFAULT_CACHE_CAPACITY;

/// How the service determines network load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMode {
    /// Peak / off-peak by UTC hour.
    Hourly,
    /// A fixed load level.
    Static(NetworkLoad),
}

impl FromStr for NetworkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("hourly") {
            return Ok(Self::Hourly);
        }
        s.parse::<NetworkLoad>().map(Self::Static)
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory. Only used with the
    /// `rocksdb-backend` feature; the in-memory store is used otherwise.
    pub data_dir: Option<String>,

    /// JSON catalog seed for the in-memory store.
    pub seed_file: Option<String>,

    /// Config cache time-to-live in seconds (default: 30).
    pub cache_ttl_seconds: u64,

    /// Entry cap per config cache map (default: 10000).
    pub cache_capacity: usize,

    /// Network load source (default: hourly).
    pub network: NetworkMode,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Largest accepted batch.
    pub max_batch_size: usize,

    /// Deadline for a whole batch in seconds.
    pub batch_timeout_seconds: u64,

    /// Engine configuration.
    pub engine: EngineConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables and the optional
    /// engine config file (`ENGINE_CONFIG_FILE`).
    #[must_use]
    pub fn from_env() -> Self {
        let mut engine = load_engine_config();

        if let Some(price) = env_parse::<f64>("FALLBACK_ENERGY_PRICE") {
            engine = engine.with_fallback_price(ResourceType::Energy, price);
        }
        if let Some(price) = env_parse::<f64>("FALLBACK_BANDWIDTH_PRICE") {
            engine = engine.with_fallback_price(ResourceType::Bandwidth, price);
        }
        if let Some(capacity) = env_parse::<usize>("HISTORY_QUEUE_CAPACITY") {
            engine = engine.with_history_queue_capacity(capacity);
        }
        if let Some(workers) = env_parse::<usize>("BATCH_WORKERS") {
            engine = engine.with_batch_workers(workers);
        }

        let network = match std::env::var("NETWORK_LOAD") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %value, error = %e, "Invalid NETWORK_LOAD, using hourly");
                NetworkMode::Hourly
            }),
            Err(_) => NetworkMode::Hourly,
        };

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").ok(),
            seed_file: std::env::var("SEED_FILE").ok(),
            cache_ttl_seconds: env_parse("CONFIG_CACHE_TTL_SECONDS").unwrap_or(30),
            cache_capacity: env_parse("CONFIG_CACHE_CAPACITY").unwrap_or(DEFAULT_CACHE_CAPACITY),
            network,
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS").unwrap_or(30),
            max_batch_size: env_parse("MAX_BATCH_SIZE").unwrap_or(1000),
            batch_timeout_seconds: env_parse("BATCH_TIMEOUT_SECONDS").unwrap_or(10),
            engine,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Load the engine config from `ENGINE_CONFIG_FILE`, or defaults.
fn load_engine_config() -> EngineConfig {
    let Ok(path) = std::env::var("ENGINE_CONFIG_FILE") else {
        return EngineConfig::default();
    };

    match load_config_file::<EngineConfig>(&path) {
        Ok(config) => {
            tracing::info!(path = %path, "Loaded engine config from file");
            config
        }
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Failed to load engine config, using defaults");
            EngineConfig::default()
        }
    }
}

/// Load a JSON config file.
fn load_config_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Config file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: None,
            seed_file: None,
            cache_ttl_seconds: 30,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            network: NetworkMode::Hourly,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            max_batch_size: 1000,
            batch_timeout_seconds: 10,
            engine: EngineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_mode_parses_levels_and_hourly() {
        assert_eq!("hourly".parse::<NetworkMode>().unwrap(), NetworkMode::Hourly);
        assert_eq!(
            "high".parse::<NetworkMode>().unwrap(),
            NetworkMode::Static(NetworkLoad::High)
        );
        assert!("busy".parse::<NetworkMode>().is_err());
    }

    #[test]
    fn engine_config_file_is_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"fallback_energy_price": 2.0}"#).unwrap();

        let config: EngineConfig = load_config_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.fallback_price(ResourceType::Energy), Some(2.0));
        assert_eq!(config.max_quantity, EngineConfig::default().max_quantity);
    }

    #[test]
    fn missing_config_file_is_not_found() {
        let err = load_config_file::<EngineConfig>("/nonexistent/engine.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
