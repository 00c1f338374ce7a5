//! Pricing configuration records.
//!
//! These are the read-only records the engine consumes through the config
//! store: catalog packages, bot/agent overrides, and system-wide limits.

use serde::{Deserialize, Serialize};

use crate::{AgentId, BotId, EntityType, PackageId, ResourceType, UserLevel};

// ============================================================================
// Constants
// ============================================================================

/// Default lower bound for a final price.
pub const DEFAULT_MIN_PRICE: f64 = 0.0;

/// Default upper bound for a final price.
pub const DEFAULT_MAX_PRICE: f64 = 1_000_000.0;

/// Default minimum order value (orders below it only warn).
pub const DEFAULT_MIN_ORDER_VALUE: f64 = 0.1;

/// Default maximum order value.
pub const DEFAULT_MAX_ORDER_VALUE: f64 = 1_000_000.0;

/// Whether a configuration record participates in pricing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigStatus {
    /// Record is used for pricing.
    #[default]
    Active,
    /// Record is kept but ignored.
    Inactive,
}

impl ConfigStatus {
    /// Whether the record participates in pricing.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A quantity threshold with its discount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantityTier {
    /// Minimum quantity at which the tier applies.
    pub threshold: u64,
    /// Discount in percent (0-100).
    pub discount_percent: f64,
}

impl QuantityTier {
    /// Create a new tier.
    #[must_use]
    pub const fn new(threshold: u64, discount_percent: f64) -> Self {
        Self {
            threshold,
            discount_percent,
        }
    }
}

/// A priced catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package identifier.
    pub id: PackageId,

    /// Display name.
    pub name: String,

    /// Resource the package sells.
    pub resource_type: ResourceType,

    /// Default unit price (per quantity unit).
    pub base_price: f64,

    /// Smallest allowed quantity.
    #[serde(default)]
    pub min_quantity: Option<u64>,

    /// Largest allowed quantity.
    #[serde(default)]
    pub max_quantity: Option<u64>,

    /// Quantity discount tiers (any order).
    #[serde(default)]
    pub quantity_discount_tiers: Vec<QuantityTier>,

    /// Flat discount in percent, composed with the tier discount.
    #[serde(default)]
    pub discount_percentage: f64,

    /// Lower clamp for the discounted unit price.
    #[serde(default)]
    pub min_price: Option<f64>,

    /// Upper clamp for the discounted unit price.
    #[serde(default)]
    pub max_price: Option<f64>,

    /// Flat fee charged per order.
    #[serde(default)]
    pub fee_amount: f64,

    /// Tax in percent, charged on the discounted subtotal plus fee.
    #[serde(default)]
    pub tax_percent: f64,

    /// Whether the package is sold.
    #[serde(default)]
    pub status: ConfigStatus,
}

impl PackageInfo {
    /// Create an active package with no tiers, fees or clamps.
    #[must_use]
    pub fn new(name: impl Into<String>, resource_type: ResourceType, base_price: f64) -> Self {
        Self {
            id: PackageId::generate(),
            name: name.into(),
            resource_type,
            base_price,
            min_quantity: None,
            max_quantity: None,
            quantity_discount_tiers: Vec::new(),
            discount_percentage: 0.0,
            min_price: None,
            max_price: None,
            fee_amount: 0.0,
            tax_percent: 0.0,
            status: ConfigStatus::Active,
        }
    }

    /// Set the quantity tiers.
    #[must_use]
    pub fn with_tiers(mut self, tiers: Vec<QuantityTier>) -> Self {
        self.quantity_discount_tiers = tiers;
        self
    }

    /// Set the flat discount.
    #[must_use]
    pub fn with_discount_percentage(mut self, percent: f64) -> Self {
        self.discount_percentage = percent;
        self
    }

    /// Set the fee and tax.
    #[must_use]
    pub fn with_fee_and_tax(mut self, fee_amount: f64, tax_percent: f64) -> Self {
        self.fee_amount = fee_amount;
        self.tax_percent = tax_percent;
        self
    }

    /// Set the unit price clamp.
    #[must_use]
    pub fn with_price_clamp(mut self, min_price: Option<f64>, max_price: Option<f64>) -> Self {
        self.min_price = min_price;
        self.max_price = max_price;
        self
    }

    /// Set the quantity bounds.
    #[must_use]
    pub fn with_quantity_bounds(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_quantity = min;
        self.max_quantity = max;
        self
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: ConfigStatus) -> Self {
        self.status = status;
        self
    }

    /// The scope this package prices at when no override applies.
    #[must_use]
    pub fn default_scope(&self) -> OverrideScope {
        OverrideScope {
            unit_price: self.base_price,
            min_quantity: self.min_quantity,
            max_quantity: self.max_quantity,
            quantity_discount_tiers: self.quantity_discount_tiers.clone(),
            discount_percentage: self.discount_percentage,
            min_price: self.min_price,
            max_price: self.max_price,
            fee_amount: self.fee_amount,
            tax_percent: self.tax_percent,
            status: self.status,
        }
    }
}

/// Who an override belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum OverrideTarget {
    /// Reseller agent override.
    Agent(AgentId),
    /// Bot override.
    Bot(BotId),
}

impl OverrideTarget {
    /// History key for this target's override on `package_id`.
    ///
    /// Overrides are priced per package, so the entity id is
    /// `{target_id}:{package_id}` and prices on different packages never
    /// share a history.
    #[must_use]
    pub fn history_entity(&self, package_id: &PackageId) -> (EntityType, String) {
        match self {
            Self::Agent(id) => (EntityType::Agent, format!("{id}:{package_id}")),
            Self::Bot(id) => (EntityType::Bot, format!("{id}:{package_id}")),
        }
    }
}

/// A resolved pricing configuration for one package/bot/agent combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideScope {
    /// Unit price (per quantity unit).
    pub unit_price: f64,
    /// Smallest allowed quantity.
    pub min_quantity: Option<u64>,
    /// Largest allowed quantity.
    pub max_quantity: Option<u64>,
    /// Quantity discount tiers.
    pub quantity_discount_tiers: Vec<QuantityTier>,
    /// Flat discount in percent.
    pub discount_percentage: f64,
    /// Lower clamp for the discounted unit price.
    pub min_price: Option<f64>,
    /// Upper clamp for the discounted unit price.
    pub max_price: Option<f64>,
    /// Flat fee per order.
    pub fee_amount: f64,
    /// Tax in percent.
    pub tax_percent: f64,
    /// Active or inactive.
    pub status: ConfigStatus,
}

impl OverrideScope {
    /// A bare scope with only a unit price, used for the system fallback.
    #[must_use]
    pub fn flat(unit_price: f64) -> Self {
        Self {
            unit_price,
            min_quantity: None,
            max_quantity: None,
            quantity_discount_tiers: Vec::new(),
            discount_percentage: 0.0,
            min_price: None,
            max_price: None,
            fee_amount: 0.0,
            tax_percent: 0.0,
            status: ConfigStatus::Active,
        }
    }
}

/// A bot- or agent-specific price override for one package.
///
/// Unset fields inherit from the package record. Overrides are deactivated
/// rather than deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOverride {
    /// Owner of the override.
    pub target: OverrideTarget,
    /// Package the override applies to.
    pub package_id: PackageId,
    /// Overridden unit price.
    pub unit_price: f64,
    /// Overridden minimum quantity.
    #[serde(default)]
    pub min_quantity: Option<u64>,
    /// Overridden maximum quantity.
    #[serde(default)]
    pub max_quantity: Option<u64>,
    /// Overridden quantity tiers.
    #[serde(default)]
    pub quantity_discount_tiers: Option<Vec<QuantityTier>>,
    /// Overridden flat discount.
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    /// Active or inactive.
    #[serde(default)]
    pub status: ConfigStatus,
}

impl PriceOverride {
    /// Create an active override that only changes the unit price.
    #[must_use]
    pub fn new(target: OverrideTarget, package_id: PackageId, unit_price: f64) -> Self {
        Self {
            target,
            package_id,
            unit_price,
            min_quantity: None,
            max_quantity: None,
            quantity_discount_tiers: None,
            discount_percentage: None,
            status: ConfigStatus::Active,
        }
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: ConfigStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the quantity tiers.
    #[must_use]
    pub fn with_tiers(mut self, tiers: Vec<QuantityTier>) -> Self {
        self.quantity_discount_tiers = Some(tiers);
        self
    }

    /// Merge this override over a base scope.
    #[must_use]
    pub fn apply_to(&self, base: &OverrideScope) -> OverrideScope {
        OverrideScope {
            unit_price: self.unit_price,
            min_quantity: self.min_quantity.or(base.min_quantity),
            max_quantity: self.max_quantity.or(base.max_quantity),
            quantity_discount_tiers: self
                .quantity_discount_tiers
                .clone()
                .unwrap_or_else(|| base.quantity_discount_tiers.clone()),
            discount_percentage: self.discount_percentage.unwrap_or(base.discount_percentage),
            min_price: base.min_price,
            max_price: base.max_price,
            fee_amount: base.fee_amount,
            tax_percent: base.tax_percent,
            status: self.status,
        }
    }
}

/// Absolute order limits per customer tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpendLimits {
    /// Limit for regular customers.
    pub regular: f64,
    /// Limit for premium customers.
    pub premium: f64,
    /// Limit for VIP customers.
    pub vip: f64,
}

impl SpendLimits {
    /// Limit for the given tier.
    #[must_use]
    pub const fn for_level(&self, level: UserLevel) -> f64 {
        match level {
            UserLevel::Regular => self.regular,
            UserLevel::Premium => self.premium,
            UserLevel::Vip => self.vip,
        }
    }
}

impl Default for SpendLimits {
    fn default() -> Self {
        Self {
            regular: 10_000.0,
            premium: 100_000.0,
            vip: DEFAULT_MAX_ORDER_VALUE,
        }
    }
}

/// System-wide price bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemLimits {
    /// Orders below this value produce a warning.
    pub min_order_value: f64,
    /// Orders above this value are rejected.
    pub max_order_value: f64,
    /// Lowest acceptable final price.
    pub min_price: f64,
    /// Highest acceptable final price.
    pub max_price: f64,
    /// Per-tier spend limits.
    #[serde(default)]
    pub spend_limits: SpendLimits,
}

impl Default for SystemLimits {
    fn default() -> Self {
        Self {
            min_order_value: DEFAULT_MIN_ORDER_VALUE,
            max_order_value: DEFAULT_MAX_ORDER_VALUE,
            min_price: DEFAULT_MIN_PRICE,
            max_price: DEFAULT_MAX_PRICE,
            spend_limits: SpendLimits::default(),
        }
    }
}

impl SystemLimits {
    /// Spend limit for a customer tier, capped by the maximum order value
    /// and the highest acceptable final price.
    #[must_use]
    pub fn spend_limit(&self, level: UserLevel) -> f64 {
        self.spend_limits
            .for_level(level)
            .min(self.max_order_value)
            .min(self.max_price)
    }
}
