//! Price history handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use energy_pricing_core::{EntityType, PriceHistoryEntry};
use energy_pricing_store::HistorySink;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

/// Query parameters for history listing.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum entries to return (default 50, capped at 500).
    pub limit: Option<usize>,
}

/// List price changes for an entity, newest first.
///
/// GET /v1/history/:entity_type/:entity_id
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Path((entity_type, entity_id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<PriceHistoryEntry>>, ApiError> {
    let entity_type: EntityType = entity_type.parse().map_err(ApiError::BadRequest)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let entries = state.store.list(entity_type, &entity_id, limit)?;
    Ok(Json(entries))
}
