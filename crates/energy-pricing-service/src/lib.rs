//! Energy Pricing HTTP API Service.
//!
//! A thin axum surface over the pricing engine:
//!
//! - Single and batch price calculation
//! - Input validation without pricing
//! - Package administration through typed patches
//! - Price history queries
//!
//! Configuration is read from the environment (see [`ServiceConfig`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{NetworkMode, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, PricingStore};
