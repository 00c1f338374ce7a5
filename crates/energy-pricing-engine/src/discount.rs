//! Quantity-tier and flat discounts.

use energy_pricing_core::{round_price, CalculationInput, OverrideScope, QuantityTier};

/// Rule name recorded for the flat discount.
pub const FLAT_DISCOUNT_RULE: &str = "flat_discount";

/// Rule name recorded when the discounted unit price hit the lower clamp.
pub const CLAMPED_TO_MIN_RULE: &str = "clamped_to_min";

/// Rule name recorded when the discounted unit price hit the upper clamp.
pub const CLAMPED_TO_MAX_RULE: &str = "clamped_to_max";

/// Discount amount plus the rules that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscountOutcome {
    /// Unit price after discounts and clamping, before resource adjustments.
    pub unit_price: f64,
    /// Total discount off the subtotal (never negative).
    pub discount_amount: f64,
    /// Rules that fired, in application order.
    pub applied_rules: Vec<String>,
}

/// Applies a scope's discount rules to a resolved unit price.
///
/// Tiers are exclusive: the tier with the highest threshold not above the
/// quantity wins. The flat discount composes multiplicatively with it, so the
/// combined discount is `subtotal * (1 - (1 - tier) * (1 - flat))`. The
/// discounted unit price is then clamped to the scope's `[min_price,
/// max_price]`, never above the undiscounted price.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountEngine;

impl DiscountEngine {
    /// Compute the discount for `input.quantity` units at `unit_price`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn apply_discounts(
        &self,
        unit_price: f64,
        input: &CalculationInput,
        scope: &OverrideScope,
    ) -> DiscountOutcome {
        let quantity = input.quantity as f64;
        let mut applied_rules = Vec::new();
        let mut factor = 1.0;

        if let Some(tier) = matching_tier(&scope.quantity_discount_tiers, input.quantity) {
            factor *= 1.0 - percent(tier.discount_percent);
            applied_rules.push(format!("quantity_tier_{}", tier.threshold));
        }

        if scope.discount_percentage > 0.0 {
            factor *= 1.0 - percent(scope.discount_percentage);
            applied_rules.push(FLAT_DISCOUNT_RULE.to_string());
        }

        let mut discounted = unit_price * factor;

        if let Some(min_price) = scope.min_price {
            let floor = min_price.min(unit_price);
            if discounted < floor {
                discounted = floor;
                applied_rules.push(CLAMPED_TO_MIN_RULE.to_string());
            }
        }
        if let Some(max_price) = scope.max_price {
            if discounted > max_price {
                discounted = max_price.max(0.0);
                applied_rules.push(CLAMPED_TO_MAX_RULE.to_string());
            }
        }

        let discount_amount = round_price((unit_price - discounted) * quantity).max(0.0);

        DiscountOutcome {
            unit_price: discounted,
            discount_amount,
            applied_rules,
        }
    }
}

/// The exclusive tier for a quantity: highest threshold not above it.
fn matching_tier(tiers: &[QuantityTier], quantity: u64) -> Option<&QuantityTier> {
    let mut sorted: Vec<&QuantityTier> = tiers.iter().collect();
    sorted.sort_by(|a, b| b.threshold.cmp(&a.threshold));
    sorted.into_iter().find(|tier| tier.threshold <= quantity)
}

fn percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0) / 100.0
}
