//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, patch, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, history, packages, pricing};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for pricing endpoints.
const PRICING_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for admin and history endpoints.
const ADMIN_MAX_CONCURRENT_REQUESTS: usize = 20;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Pricing
/// - `POST /v1/prices/calculate` - Price one request
/// - `POST /v1/prices/batch` - Price many requests
/// - `POST /v1/prices/validate` - Validate a request without pricing
///
/// ## Administration
/// - `GET /v1/packages/:id` - Get a package
/// - `PATCH /v1/packages/:id` - Patch a package
/// - `PATCH /v1/packages/:id/overrides/:target_type/:target_id` - Patch an override
/// - `GET /v1/history/:entity_type/:entity_id` - Price history, newest first
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let pricing_routes = Router::new()
        .route("/calculate", post(pricing::calculate))
        .route("/batch", post(pricing::batch))
        .route("/validate", post(pricing::validate))
        .layer(ConcurrencyLimitLayer::new(PRICING_MAX_CONCURRENT_REQUESTS));

    let admin_routes = Router::new()
        .route(
            "/packages/:id",
            get(packages::get_package).patch(packages::patch_package),
        )
        .route(
            "/packages/:id/overrides/:target_type/:target_id",
            patch(packages::patch_override),
        )
        .route(
            "/history/:entity_type/:entity_id",
            get(history::list_history),
        )
        .layer(ConcurrencyLimitLayer::new(ADMIN_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", Router::new().nest("/prices", pricing_routes).merge(admin_routes))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
