//! Price calculation handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use energy_pricing_core::{CalculationInput, PriceBreakdown, ValidationResult};
use energy_pricing_engine::{degraded_count, CalculationOptions};

use crate::error::ApiError;
use crate::state::AppState;

/// Per-request overrides of the calculation options.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsRequest {
    /// Run input validation before pricing.
    pub validate_input: Option<bool>,
    /// Record observed prices in the history.
    pub include_history: Option<bool>,
}

impl OptionsRequest {
    fn apply(&self, mut options: CalculationOptions) -> CalculationOptions {
        if let Some(validate) = self.validate_input {
            options = options.with_validation(validate);
        }
        if let Some(history) = self.include_history {
            options = options.with_history(history);
        }
        options
    }
}

/// Single calculation request: the input fields plus optional options.
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    /// What to price.
    #[serde(flatten)]
    pub input: CalculationInput,
    /// Option overrides.
    #[serde(default)]
    pub options: OptionsRequest,
}

/// Batch calculation request.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    /// Requests to price, answered in the same order.
    pub items: Vec<CalculationInput>,
    /// Option overrides applied to every item.
    #[serde(default)]
    pub options: OptionsRequest,
}

/// Batch calculation response.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// One breakdown per item, in input order.
    pub results: Vec<PriceBreakdown>,
    /// Number of items that failed and carry an `error`.
    pub degraded: usize,
}

/// Price a single request.
///
/// POST /v1/prices/calculate
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalculateRequest>,
) -> Result<Json<PriceBreakdown>, ApiError> {
    let options = request.options.apply(CalculationOptions::default());
    let breakdown = state.calculator.calculate(&request.input, &options)?;

    tracing::debug!(
        resource_type = %breakdown.resource_type,
        quantity = breakdown.quantity,
        final_price = breakdown.final_price,
        "Price calculated"
    );

    Ok(Json(breakdown))
}

/// Price many requests. Item failures are reported in place; the request
/// itself only fails if the batch is too large.
///
/// POST /v1/prices/batch
pub async fn batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let max = state.config.max_batch_size;
    if request.items.len() > max {
        return Err(ApiError::BadRequest(format!(
            "batch of {} items exceeds the maximum of {max}",
            request.items.len()
        )));
    }

    let options = request.options.apply(
        CalculationOptions::batch()
            .with_timeout(Duration::from_secs(state.config.batch_timeout_seconds)),
    );
    let results = state.calculator.batch_calculate(request.items, options).await;
    let degraded = degraded_count(&results);

    Ok(Json(BatchResponse { results, degraded }))
}

/// Validate a request without pricing it.
///
/// POST /v1/prices/validate
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CalculationInput>,
) -> Json<ValidationResult> {
    Json(state.calculator.validator().validate_input(&input))
}
