//! Input and result validation.
//!
//! Input errors stop a calculation before it starts. Result errors mean the
//! engine produced an inconsistent breakdown and are raised even when input
//! validation was skipped. Warnings never block.

use energy_pricing_core::{
    approx_eq, CalculationInput, PriceBreakdown, PricingError, Result, SystemLimits,
    ValidationIssue, ValidationResult,
};

use crate::adjuster::adjuster_for;
use crate::config::EngineConfig;

/// Discount share of the subtotal above which a warning is emitted.
pub const HIGH_DISCOUNT_RATIO: f64 = 0.5;

/// Fee share of the subtotal above which a warning is emitted.
pub const HIGH_FEE_RATIO: f64 = 0.3;

/// Applied rule count above which a warning is emitted.
pub const MANY_RULES: usize = 5;

/// Validates requests and computed breakdowns.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_quantity: u64,
    max_amount: f64,
    large_quantity: u64,
}

impl Validator {
    /// Create a validator from the engine configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_quantity: config.max_quantity,
            max_amount: config.max_amount,
            large_quantity: config.large_quantity,
        }
    }

    /// Validate a request.
    #[must_use]
    pub fn validate_input(&self, input: &CalculationInput) -> ValidationResult {
        let mut result = ValidationResult::valid();

        if input.quantity == 0 || input.quantity > self.max_quantity {
            result.error(ValidationIssue::new(
                "quantity",
                "quantity_out_of_range",
                format!(
                    "quantity must be between 1 and {}, got {}",
                    self.max_quantity, input.quantity
                ),
            ));
        } else if input.quantity > self.large_quantity {
            result.warn(ValidationIssue::new(
                "quantity",
                "large_quantity",
                format!("quantity {} is unusually large", input.quantity),
            ));
            result.suggest("Split large orders into a batch pricing request");
        }

        if !input.amount.is_finite() || input.amount <= 0.0 {
            result.error(ValidationIssue::new(
                "amount",
                "amount_not_positive",
                format!("amount must be a positive number, got {}", input.amount),
            ));
        } else if input.amount > self.max_amount {
            result.error(ValidationIssue::new(
                "amount",
                "amount_out_of_range",
                format!(
                    "amount must not exceed {}, got {}",
                    self.max_amount, input.amount
                ),
            ));
        } else {
            for warning in adjuster_for(input.resource_type).soft_bound_warnings(input.amount) {
                result.warn(warning);
            }
        }

        result
    }

    /// Validate a computed breakdown against its own invariants and the
    /// system limits.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn validate_result(
        &self,
        breakdown: &PriceBreakdown,
        input: &CalculationInput,
        limits: &SystemLimits,
    ) -> ValidationResult {
        let mut result = ValidationResult::valid();
        let b = breakdown;

        if b.quantity != input.quantity {
            result.error(ValidationIssue::new(
                "quantity",
                "quantity_mismatch",
                format!("breakdown quantity {} != requested {}", b.quantity, input.quantity),
            ));
        }

        let expected_subtotal = b.base_amount * b.quantity as f64;
        if !approx_eq(b.subtotal, expected_subtotal) {
            result.error(ValidationIssue::new(
                "subtotal",
                "subtotal_mismatch",
                format!("subtotal {} != base_amount * quantity {expected_subtotal}", b.subtotal),
            ));
        }

        let expected_total = b.subtotal - b.discount_amount + b.fee_amount + b.tax_amount;
        if !approx_eq(b.total, expected_total) {
            result.error(ValidationIssue::new(
                "total",
                "total_mismatch",
                format!("total {} != subtotal - discount + fee + tax {expected_total}", b.total),
            ));
        }

        if !approx_eq(b.final_price, b.total) {
            result.error(ValidationIssue::new(
                "final_price",
                "final_price_mismatch",
                format!("final price {} != total {}", b.final_price, b.total),
            ));
        }

        for (field, value) in [
            ("subtotal", b.subtotal),
            ("discount_amount", b.discount_amount),
            ("fee_amount", b.fee_amount),
            ("tax_amount", b.tax_amount),
        ] {
            if value < 0.0 || !value.is_finite() {
                result.error(ValidationIssue::new(
                    field,
                    "negative_component",
                    format!("{field} must be a non-negative number, got {value}"),
                ));
            }
        }

        if b.final_price < limits.min_price || b.final_price > limits.max_price {
            result.error(ValidationIssue::new(
                "final_price",
                "final_price_out_of_bounds",
                format!(
                    "final price {} outside [{}, {}]",
                    b.final_price, limits.min_price, limits.max_price
                ),
            ));
        }

        if b.subtotal > 0.0 {
            if b.discount_amount > b.subtotal * HIGH_DISCOUNT_RATIO {
                result.warn(ValidationIssue::new(
                    "discount_amount",
                    "high_discount",
                    format!(
                        "discount {} is more than half of subtotal {}",
                        b.discount_amount, b.subtotal
                    ),
                ));
            }
            if b.fee_amount > b.subtotal * HIGH_FEE_RATIO {
                result.warn(ValidationIssue::new(
                    "fee_amount",
                    "high_fee",
                    format!("fee {} exceeds 30% of subtotal {}", b.fee_amount, b.subtotal),
                ));
            }
        }

        if b.applied_rules.len() > MANY_RULES {
            result.warn(ValidationIssue::new(
                "applied_rules",
                "many_rules",
                format!("{} pricing rules applied", b.applied_rules.len()),
            ));
        }

        if b.total < limits.min_order_value {
            result.warn(ValidationIssue::new(
                "total",
                "below_min_order_value",
                format!(
                    "total {} is below the minimum order value {}",
                    b.total, limits.min_order_value
                ),
            ));
        }

        result
    }

    /// Reject orders above the customer tier's spend limit.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::SpendLimitExceeded` if the total is over the limit.
    pub fn check_spend_limit(
        &self,
        breakdown: &PriceBreakdown,
        input: &CalculationInput,
        limits: &SystemLimits,
    ) -> Result<()> {
        let level = input.level();
        let limit = limits.spend_limit(level);
        if breakdown.total > limit {
            return Err(PricingError::SpendLimitExceeded {
                level,
                total: breakdown.total,
                limit,
            });
        }
        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
