//! Key encoding for the `RocksDB` column families.

use energy_pricing_core::{EntityType, HistoryEntryId, OverrideTarget, PackageId};

/// Key of the system limits record in the `system` column family.
pub const SYSTEM_LIMITS_KEY: &[u8] = b"system_limits";

/// Create a package key.
#[must_use]
pub fn package_key(package_id: &PackageId) -> Vec<u8> {
    package_id.as_bytes().to_vec()
}

/// Create an override key.
///
/// Format: `tag (1 byte) || target_id (16 bytes) || package_id (16 bytes)`
#[must_use]
pub fn override_key(target: &OverrideTarget, package_id: &PackageId) -> Vec<u8> {
    let (tag, id) = match target {
        OverrideTarget::Agent(agent_id) => (0u8, agent_id.as_bytes()),
        OverrideTarget::Bot(bot_id) => (1u8, bot_id.as_bytes()),
    };

    let mut key = Vec::with_capacity(33);
    key.push(tag);
    key.extend_from_slice(id);
    key.extend_from_slice(package_id.as_bytes());
    key
}

const fn entity_tag(entity_type: EntityType) -> u8 {
    match entity_type {
        EntityType::Package => 0,
        EntityType::Bot => 1,
        EntityType::Agent => 2,
    }
}

/// Create a prefix for iterating an entity's history.
///
/// The trailing `0x00` keeps `abc` from matching `abcd`.
#[must_use]
pub fn history_prefix(entity_type: EntityType, entity_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(entity_id.len() + 2);
    key.push(entity_tag(entity_type));
    key.extend_from_slice(entity_id.as_bytes());
    key.push(0);
    key
}

/// Create a history key.
///
/// Entry IDs are ULIDs, so an entity's entries sort by time.
#[must_use]
pub fn history_key(entity_type: EntityType, entity_id: &str, entry_id: &HistoryEntryId) -> Vec<u8> {
    let mut key = history_prefix(entity_type, entity_id);
    key.extend_from_slice(&entry_id.to_bytes());
    key
}
