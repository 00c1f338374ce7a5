//! Column family layout for the `RocksDB` backend.

/// Column family names.
pub mod cf {
    /// Catalog packages, keyed by `package_id`.
    pub const PACKAGES: &str = "packages";

    /// Bot and agent overrides, keyed by `target_tag || target_id || package_id`.
    pub const OVERRIDES: &str = "overrides";

    /// Singleton records such as the system limits.
    pub const SYSTEM: &str = "system";

    /// Price history, keyed by `entity_tag || entity_id || 0x00 || entry_id`.
    pub const PRICE_HISTORY: &str = "price_history";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::PACKAGES, cf::OVERRIDES, cf::SYSTEM, cf::PRICE_HISTORY]
}
