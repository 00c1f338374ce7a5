//! Price history (audit) records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::HistoryEntryId;

/// Kind of entity a price belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Catalog package.
    Package,
    /// Bot override.
    Bot,
    /// Agent override.
    Agent,
}

impl EntityType {
    /// Get the entity type name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Bot => "bot",
            Self::Agent => "agent",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "package" => Ok(Self::Package),
            "bot" => Ok(Self::Bot),
            "agent" => Ok(Self::Agent),
            other => Err(format!("unknown entity type: {other}")),
        }
    }
}

/// An append-only audit record of a price change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    /// Unique, time-ordered identifier.
    pub id: HistoryEntryId,

    /// Kind of entity.
    pub entity_type: EntityType,

    /// Entity identifier.
    pub entity_id: String,

    /// Previously recorded price (`None` for the first observation).
    pub old_price: Option<f64>,

    /// New price.
    pub new_price: f64,

    /// Why the price changed.
    pub change_reason: String,

    /// Who or what changed it.
    pub changed_by: String,

    /// When the change was recorded.
    pub changed_at: DateTime<Utc>,

    /// Free-form context.
    pub metadata: serde_json::Value,
}

impl PriceHistoryEntry {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        old_price: Option<f64>,
        new_price: f64,
        change_reason: impl Into<String>,
        changed_by: impl Into<String>,
    ) -> Self {
        Self {
            id: HistoryEntryId::generate(),
            entity_type,
            entity_id: entity_id.into(),
            old_price,
            new_price,
            change_reason: change_reason.into(),
            changed_by: changed_by.into(),
            changed_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Set metadata on the entry.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_round_trips_through_str() {
        for kind in [EntityType::Package, EntityType::Bot, EntityType::Agent] {
            assert_eq!(kind.as_str().parse::<EntityType>(), Ok(kind));
        }
        assert!("order".parse::<EntityType>().is_err());
    }

    #[test]
    fn new_entry_has_no_metadata() {
        let entry = PriceHistoryEntry::new(
            EntityType::Package,
            "pkg",
            Some(1.0),
            1.2,
            "price_update",
            "admin",
        );
        assert!(entry.metadata.is_null());
        assert_eq!(entry.old_price, Some(1.0));
    }
}
