//! HTTP request handlers.

pub mod health;
pub mod history;
pub mod packages;
pub mod pricing;
