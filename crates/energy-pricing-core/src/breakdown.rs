//! Price breakdown types.

use serde::{Deserialize, Serialize};

use crate::{ResourceType, ValidationIssue};

/// Currency every price is quoted in.
pub const PRICE_CURRENCY: &str = "TRX";

/// Which level of the override hierarchy supplied the unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideLevel {
    /// Agent-specific override.
    Agent,
    /// Bot-specific override.
    Bot,
    /// Package default price.
    Package,
    /// System fallback constant.
    System,
}

impl OverrideLevel {
    /// Get the level name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Bot => "bot",
            Self::Package => "package",
            Self::System => "system",
        }
    }
}

/// How a breakdown was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationPath {
    /// Single-item calculation.
    #[default]
    Single,
    /// Fast batch path with shared resolution.
    Batch,
    /// Batch item recomputed individually after bulk resolution failed.
    Fallback,
}

/// One multiplicative adjustment applied to the unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    /// Adjustment name (e.g. `bulk_efficiency`, `network_load`, `priority`).
    pub name: String,
    /// Multiplier applied.
    pub multiplier: f64,
}

impl AppliedAdjustment {
    /// Create a new adjustment record.
    #[must_use]
    pub fn new(name: impl Into<String>, multiplier: f64) -> Self {
        Self {
            name: name.into(),
            multiplier,
        }
    }
}

/// The itemized result of a calculation.
///
/// Invariants (checked by the validator):
/// - `subtotal == base_amount * quantity`
/// - `total == subtotal - discount_amount + fee_amount + tax_amount`
/// - `final_price == total`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Resource that was priced.
    pub resource_type: ResourceType,

    /// Resolved unit price before adjustments.
    pub unit_price: f64,

    /// Unit price after adjustments, before quantity.
    pub base_amount: f64,

    /// Number of units.
    pub quantity: u64,

    /// `base_amount * quantity`.
    pub subtotal: f64,

    /// Total discount (never negative).
    pub discount_amount: f64,

    /// Fees.
    pub fee_amount: f64,

    /// Taxes.
    pub tax_amount: f64,

    /// `subtotal - discount_amount + fee_amount + tax_amount`.
    pub total: f64,

    /// What the customer pays; equal to `total`.
    pub final_price: f64,

    /// Currency code.
    pub currency: String,

    /// Hierarchy level that supplied the unit price.
    pub override_level: OverrideLevel,

    /// Discount rules that fired, in application order.
    pub applied_rules: Vec<String>,

    /// Adjustments applied, in application order.
    pub adjustments: Vec<AppliedAdjustment>,

    /// Non-fatal validation findings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationIssue>,

    /// How the breakdown was produced.
    pub path: CalculationPath,

    /// Set on degraded batch entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PriceBreakdown {
    /// A zero-priced placeholder for a batch item that could not be priced.
    #[must_use]
    pub fn degraded(
        resource_type: ResourceType,
        quantity: u64,
        path: CalculationPath,
        error: impl Into<String>,
    ) -> Self {
        Self {
            resource_type,
            unit_price: 0.0,
            base_amount: 0.0,
            quantity,
            subtotal: 0.0,
            discount_amount: 0.0,
            fee_amount: 0.0,
            tax_amount: 0.0,
            total: 0.0,
            final_price: 0.0,
            currency: PRICE_CURRENCY.to_string(),
            override_level: OverrideLevel::System,
            applied_rules: Vec::new(),
            adjustments: Vec::new(),
            warnings: Vec::new(),
            path,
            error: Some(error.into()),
        }
    }

    /// Whether this is a degraded batch entry.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_entry_is_flagged_and_zeroed() {
        let entry = PriceBreakdown::degraded(
            ResourceType::Energy,
            3,
            CalculationPath::Fallback,
            "config not found",
        );
        assert!(entry.is_degraded());
        assert_eq!(entry.final_price, 0.0);
        assert_eq!(entry.quantity, 3);
    }

    #[test]
    fn warnings_and_error_are_omitted_when_empty() {
        let mut entry =
            PriceBreakdown::degraded(ResourceType::Bandwidth, 1, CalculationPath::Batch, "x");
        entry.error = None;
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("warnings").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json["path"], "batch");
    }
}
