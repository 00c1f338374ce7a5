//! Price resolution and calculation engine for energy and bandwidth rentals.
//!
//! Given a [`CalculationInput`](energy_pricing_core::CalculationInput), the
//! engine determines what the customer pays:
//!
//! - [`PriceResolver`]: unit price via agent > bot > package > system fallback
//! - [`adjuster`]: bulk efficiency, time-of-day and priority multipliers
//! - [`DiscountEngine`]: exclusive quantity tiers, flat discount, price clamp
//! - [`Validator`]: input checks, breakdown invariants, spend limits
//! - [`HistoryRecorder`]: fire-and-forget audit trail
//! - [`Calculator`]: single and batch orchestration
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use energy_pricing_core::{CalculationInput, PackageInfo, ResourceType};
//! use energy_pricing_engine::{
//!     CalculationOptions, Calculator, EngineConfig, NetworkLoad, StaticNetworkStatus,
//! };
//! use energy_pricing_store::{ConfigWriter, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let package = PackageInfo::new("Energy 32k", ResourceType::Energy, 1.5);
//! store.put_package(&package).unwrap();
//!
//! let calculator = Calculator::new(
//!     store,
//!     Arc::new(StaticNetworkStatus(NetworkLoad::Medium)),
//!     &EngineConfig::default(),
//! )
//! .unwrap();
//!
//! let input = CalculationInput::energy(1, 1000.0).with_package(package.id);
//! let breakdown = calculator
//!     .calculate(&input, &CalculationOptions::default())
//!     .unwrap();
//! assert_eq!(breakdown.final_price, 1.5);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod adjuster;
pub mod calculator;
pub mod config;
pub mod discount;
pub mod history;
pub mod resolver;
pub mod validator;

pub use adjuster::{
    adjuster_for, BandwidthAdjuster, EnergyAdjuster, HourlyNetworkStatus, NetworkLoad,
    NetworkStatusError, NetworkStatusProvider, ResourceAdjuster, StaticNetworkStatus,
};
pub use calculator::{degraded_count, CalculationOptions, Calculator};
pub use config::EngineConfig;
pub use discount::{DiscountEngine, DiscountOutcome};
pub use history::{HistoryRecorder, Observation};
pub use resolver::{PriceResolver, ResolutionKey, ResolvedPrice};
pub use validator::Validator;
