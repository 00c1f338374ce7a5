//! Typed partial updates for pricing configuration.
//!
//! A patch carries one `Option` per field; `None` means "leave unchanged".
//! Nullable fields use `Option<Option<T>>` so that an explicit JSON `null`
//! clears the value while an absent key leaves it alone. Patches are applied
//! by a single store method ([`crate::ConfigWriter::apply_package_patch`]).

use serde::{Deserialize, Deserializer, Serialize};

use energy_pricing_core::{ConfigStatus, PackageInfo, PriceOverride, QuantityTier};

/// Deserialize a present key (including `null`) as `Some(value)`.
fn present<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Partial update of a catalog package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagePatch {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New default unit price.
    #[serde(default)]
    pub base_price: Option<f64>,
    /// New minimum quantity (`null` clears).
    #[serde(default, deserialize_with = "present")]
    pub min_quantity: Option<Option<u64>>,
    /// New maximum quantity (`null` clears).
    #[serde(default, deserialize_with = "present")]
    pub max_quantity: Option<Option<u64>>,
    /// Replacement tier list.
    #[serde(default)]
    pub quantity_discount_tiers: Option<Vec<QuantityTier>>,
    /// New flat discount.
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    /// New lower clamp (`null` clears).
    #[serde(default, deserialize_with = "present")]
    pub min_price: Option<Option<f64>>,
    /// New upper clamp (`null` clears).
    #[serde(default, deserialize_with = "present")]
    pub max_price: Option<Option<f64>>,
    /// New flat fee.
    #[serde(default)]
    pub fee_amount: Option<f64>,
    /// New tax percent.
    #[serde(default)]
    pub tax_percent: Option<f64>,
    /// New status.
    #[serde(default)]
    pub status: Option<ConfigStatus>,
}

impl PackagePatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch in place, returning the names of the fields it set.
    pub fn apply(&self, package: &mut PackageInfo) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(name) = &self.name {
            package.name.clone_from(name);
            changed.push("name");
        }
        if let Some(price) = self.base_price {
            package.base_price = price;
            changed.push("base_price");
        }
        if let Some(min) = self.min_quantity {
            package.min_quantity = min;
            changed.push("min_quantity");
        }
        if let Some(max) = self.max_quantity {
            package.max_quantity = max;
            changed.push("max_quantity");
        }
        if let Some(tiers) = &self.quantity_discount_tiers {
            package.quantity_discount_tiers.clone_from(tiers);
            changed.push("quantity_discount_tiers");
        }
        if let Some(percent) = self.discount_percentage {
            package.discount_percentage = percent;
            changed.push("discount_percentage");
        }
        if let Some(min) = self.min_price {
            package.min_price = min;
            changed.push("min_price");
        }
        if let Some(max) = self.max_price {
            package.max_price = max;
            changed.push("max_price");
        }
        if let Some(fee) = self.fee_amount {
            package.fee_amount = fee;
            changed.push("fee_amount");
        }
        if let Some(tax) = self.tax_percent {
            package.tax_percent = tax;
            changed.push("tax_percent");
        }
        if let Some(status) = self.status {
            package.status = status;
            changed.push("status");
        }

        changed
    }
}

/// Partial update of a bot or agent override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverridePatch {
    /// New unit price. Required when the override does not exist yet.
    #[serde(default)]
    pub unit_price: Option<f64>,
    /// New minimum quantity (`null` inherits from the package).
    #[serde(default, deserialize_with = "present")]
    pub min_quantity: Option<Option<u64>>,
    /// New maximum quantity (`null` inherits from the package).
    #[serde(default, deserialize_with = "present")]
    pub max_quantity: Option<Option<u64>>,
    /// Replacement tiers (`null` inherits from the package).
    #[serde(default, deserialize_with = "present")]
    pub quantity_discount_tiers: Option<Option<Vec<QuantityTier>>>,
    /// New flat discount (`null` inherits from the package).
    #[serde(default, deserialize_with = "present")]
    pub discount_percentage: Option<Option<f64>>,
    /// New status.
    #[serde(default)]
    pub status: Option<ConfigStatus>,
}

impl OverridePatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch in place, returning the names of the fields it set.
    pub fn apply(&self, over: &mut PriceOverride) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(price) = self.unit_price {
            over.unit_price = price;
            changed.push("unit_price");
        }
        if let Some(min) = self.min_quantity {
            over.min_quantity = min;
            changed.push("min_quantity");
        }
        if let Some(max) = self.max_quantity {
            over.max_quantity = max;
            changed.push("max_quantity");
        }
        if let Some(tiers) = &self.quantity_discount_tiers {
            over.quantity_discount_tiers.clone_from(tiers);
            changed.push("quantity_discount_tiers");
        }
        if let Some(percent) = self.discount_percentage {
            over.discount_percentage = percent;
            changed.push("discount_percentage");
        }
        if let Some(status) = self.status {
            over.status = status;
            changed.push("status");
        }

        changed
    }
}

/// Result of applying a patch.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome<T> {
    /// Record before the patch (`None` if the patch created it).
    pub before: Option<T>,
    /// Record after the patch.
    pub after: T,
    /// Fields the patch set.
    pub changed: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_pricing_core::ResourceType;

    #[test]
    fn absent_fields_are_left_alone_and_null_clears() {
        let mut package = PackageInfo::new("Energy", ResourceType::Energy, 1.5)
            .with_quantity_bounds(Some(1), Some(100));

        let patch: PackagePatch =
            serde_json::from_str(r#"{"base_price": 1.7, "max_quantity": null}"#).unwrap();
        let changed = patch.apply(&mut package);

        assert_eq!(changed, vec!["base_price", "max_quantity"]);
        assert_eq!(package.base_price, 1.7);
        assert_eq!(package.min_quantity, Some(1));
        assert_eq!(package.max_quantity, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<PackagePatch, _> = serde_json::from_str(r#"{"price": 2.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(PackagePatch::default().is_empty());
        let patch: OverridePatch = serde_json::from_str(r#"{"status": "inactive"}"#).unwrap();
        assert!(!patch.is_empty());
    }
}
