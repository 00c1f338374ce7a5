//! Resource-specific price adjustments.
//!
//! Each resource has an adjuster that applies, in this order:
//!
//! 1. **Bulk efficiency**: a single multiplier picked by the resource amount
//! 2. **Time of day**: a multiplier from the current [`NetworkLoad`]
//! 3. **Priority**: a surcharge for emergency requests
//!
//! Multipliers compose multiplicatively and the result is rounded once,
//! after the last step. Adjusters differ only in their threshold tables and
//! the unit-specific soft bounds they report to the validator.

mod bandwidth;
mod energy;
pub mod network;

pub use bandwidth::BandwidthAdjuster;
pub use energy::EnergyAdjuster;
pub use network::{
    current_load, HourlyNetworkStatus, NetworkLoad, NetworkStatusError, NetworkStatusProvider,
    StaticNetworkStatus,
};

use energy_pricing_core::{
    round_price, AppliedAdjustment, CalculationInput, ResourceType, ValidationIssue,
};

/// Multiplier applied to emergency requests.
pub const PRIORITY_MULTIPLIER: f64 = 1.5;

/// Adjustment names as recorded on the breakdown.
pub mod names {
    /// Bulk efficiency discount.
    pub const BULK_EFFICIENCY: &str = "bulk_efficiency";
    /// Time-of-day multiplier.
    pub const NETWORK_LOAD: &str = "network_load";
    /// Emergency surcharge.
    pub const PRIORITY: &str = "priority";
}

/// An amount threshold and the multiplier it earns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulkTier {
    /// Smallest amount the tier applies to.
    pub min_amount: f64,
    /// Price multiplier.
    pub multiplier: f64,
}

/// Adjusted unit price and the multipliers that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    /// Unit price after every adjustment, rounded.
    pub price: f64,
    /// Non-neutral multipliers, in application order.
    pub applied: Vec<AppliedAdjustment>,
}

/// A resource-specific adjustment strategy.
pub trait ResourceAdjuster: Send + Sync {
    /// Resource this adjuster handles.
    fn resource_type(&self) -> ResourceType;

    /// Bulk tiers, highest `min_amount` first.
    fn bulk_tiers(&self) -> &'static [BulkTier];

    /// Non-fatal findings about the requested amount.
    fn soft_bound_warnings(&self, amount: f64) -> Vec<ValidationIssue>;

    /// Bulk multiplier for an amount. Only the first matching tier applies.
    fn bulk_multiplier(&self, amount: f64) -> f64 {
        self.bulk_tiers()
            .iter()
            .find(|tier| amount >= tier.min_amount)
            .map_or(1.0, |tier| tier.multiplier)
    }

    /// Apply bulk, time-of-day and priority multipliers to `base_price`.
    #[allow(clippy::float_cmp)]
    fn adjust(&self, base_price: f64, input: &CalculationInput, load: NetworkLoad) -> Adjustment {
        let steps = [
            (names::BULK_EFFICIENCY, self.bulk_multiplier(input.amount)),
            (names::NETWORK_LOAD, load.multiplier()),
            (
                names::PRIORITY,
                if input.is_emergency() {
                    PRIORITY_MULTIPLIER
                } else {
                    1.0
                },
            ),
        ];

        let mut price = base_price;
        let mut applied = Vec::new();
        for (name, multiplier) in steps {
            if multiplier != 1.0 {
                price *= multiplier;
                applied.push(AppliedAdjustment::new(name, multiplier));
            }
        }

        Adjustment {
            price: round_price(price),
            applied,
        }
    }
}

static ENERGY: EnergyAdjuster = EnergyAdjuster;
static BANDWIDTH: BandwidthAdjuster = BandwidthAdjuster;

/// The adjuster for a resource type.
#[must_use]
pub fn adjuster_for(resource_type: ResourceType) -> &'static dyn ResourceAdjuster {
    match resource_type {
        ResourceType::Energy => &ENERGY,
        ResourceType::Bandwidth => &BANDWIDTH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_pricing_core::approx_eq;

    #[test]
    fn adjusters_are_selected_by_resource() {
        for resource_type in [ResourceType::Energy, ResourceType::Bandwidth] {
            assert_eq!(adjuster_for(resource_type).resource_type(), resource_type);
        }
    }

    #[test]
    fn neutral_request_is_unchanged() {
        let adjustment = adjuster_for(ResourceType::Energy).adjust(
            1.5,
            &CalculationInput::energy(1, 1000.0),
            NetworkLoad::Medium,
        );
        assert_eq!(adjustment.price, 1.5);
        assert!(adjustment.applied.is_empty());
    }

    #[test]
    fn multipliers_apply_in_fixed_order() {
        let input = CalculationInput::energy(1, 600_000.0).emergency();

        let adjustment =
            adjuster_for(ResourceType::Energy).adjust(1.0, &input, NetworkLoad::High);

        let names: Vec<&str> = adjustment.applied.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["bulk_efficiency", "network_load", "priority"]);
        // 0.9 * 1.2 * 1.5
        assert!(approx_eq(adjustment.price, 1.62));
    }

    #[test]
    fn rounding_happens_once() {
        let input = CalculationInput::energy(1, 150_000.0);

        let adjustment =
            adjuster_for(ResourceType::Energy).adjust(0.333_333_3, &input, NetworkLoad::Low);

        // 0.3333333 * 0.95 * 0.8 = 0.253333308 -> 0.253333
        assert_eq!(adjustment.price, 0.253_333);
    }
}
