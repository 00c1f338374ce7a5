//! Core types for the energy/bandwidth pricing engine.
//!
//! This crate provides the foundational types shared by the engine, the
//! configuration store and the HTTP service:
//!
//! - **Identifiers**: `PackageId`, `BotId`, `AgentId`, `HistoryEntryId`
//! - **Requests**: `CalculationInput`, `ResourceType`, `UserLevel`
//! - **Configuration**: `PackageInfo`, `PriceOverride`, `OverrideScope`, `SystemLimits`
//! - **Results**: `PriceBreakdown`, `ValidationResult`
//! - **Audit**: `PriceHistoryEntry`, `EntityType`
//!
//! # Price Units
//!
//! Prices are quoted in TRX as `f64` and rounded to six decimal places
//! (see [`precision`]). A package's `base_price` is per quantity unit; the
//! resource `amount` only drives the bulk-efficiency adjustment.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod breakdown;
pub mod catalog;
pub mod error;
pub mod history;
pub mod ids;
pub mod input;
pub mod precision;
pub mod validation;

pub use breakdown::{
    AppliedAdjustment, CalculationPath, OverrideLevel, PriceBreakdown, PRICE_CURRENCY,
};
pub use catalog::{
    ConfigStatus, OverrideScope, OverrideTarget, PackageInfo, PriceOverride, QuantityTier,
    SpendLimits, SystemLimits,
};
pub use error::{PricingError, Result};
pub use history::{EntityType, PriceHistoryEntry};
pub use ids::{AgentId, BotId, HistoryEntryId, IdError, PackageId};
pub use input::{CalculationInput, ResourceType, UserLevel};
pub use precision::{approx_eq, round_price, PRICE_TOLERANCE};
pub use validation::{ValidationIssue, ValidationResult};
