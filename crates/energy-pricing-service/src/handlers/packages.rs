//! Package and override administration handlers.
//!
//! Every write goes through a typed patch, drops the affected cache entries
//! and, when a price moved, queues a history entry.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use energy_pricing_core::{
    AgentId, BotId, EntityType, IdError, OverrideTarget, PackageId, PackageInfo, PriceOverride,
};
use energy_pricing_store::{CacheKey, ConfigStore, ConfigWriter, OverridePatch, PackagePatch};

use crate::error::ApiError;
use crate::state::AppState;

/// Actor recorded for changes made through the admin API.
pub const ADMIN_ACTOR: &str = "admin-api";

/// Package response.
#[derive(Debug, Serialize)]
pub struct PackageResponse {
    /// Current record.
    pub package: PackageInfo,
    /// Fields the request changed (empty on reads).
    pub changed: Vec<&'static str>,
}

/// Override response.
#[derive(Debug, Serialize)]
pub struct OverrideResponse {
    /// Current record.
    #[serde(rename = "override")]
    pub price_override: PriceOverride,
    /// Fields the request changed.
    pub changed: Vec<&'static str>,
}

fn parse_package_id(raw: &str) -> Result<PackageId, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid package id {raw}: {e}")))
}

fn parse_target(target_type: &str, target_id: &str) -> Result<OverrideTarget, ApiError> {
    let invalid = |e: IdError| ApiError::BadRequest(format!("invalid {target_type} id {target_id}: {e}"));
    match target_type {
        "bot" => Ok(OverrideTarget::Bot(target_id.parse::<BotId>().map_err(invalid)?)),
        "agent" => Ok(OverrideTarget::Agent(
            target_id.parse::<AgentId>().map_err(invalid)?,
        )),
        other => Err(ApiError::BadRequest(format!(
            "unknown override target: {other}"
        ))),
    }
}

/// Get a package.
///
/// GET /v1/packages/:id
pub async fn get_package(
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<String>,
) -> Result<Json<PackageResponse>, ApiError> {
    let package_id = parse_package_id(&package_id)?;
    let package = state
        .store
        .get_package(&package_id)?
        .ok_or_else(|| ApiError::NotFound(format!("package not found: {package_id}")))?;

    Ok(Json(PackageResponse {
        package,
        changed: Vec::new(),
    }))
}

/// Apply a partial update to a package.
///
/// PATCH /v1/packages/:id
pub async fn patch_package(
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<String>,
    Json(patch): Json<PackagePatch>,
) -> Result<Json<PackageResponse>, ApiError> {
    let package_id = parse_package_id(&package_id)?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest("patch sets no fields".into()));
    }

    let outcome = state.store.apply_package_patch(&package_id, &patch)?;
    state.invalidate(CacheKey::Package(package_id));

    if outcome.changed.contains(&"base_price") {
        state.recorder.record(
            EntityType::Package,
            package_id.to_string(),
            outcome.before.as_ref().map(|p| p.base_price),
            outcome.after.base_price,
            "package_update",
            ADMIN_ACTOR,
            serde_json::json!({ "changed": outcome.changed }),
        );
    }

    tracing::info!(
        package_id = %package_id,
        changed = ?outcome.changed,
        "Package updated"
    );

    Ok(Json(PackageResponse {
        package: outcome.after,
        changed: outcome.changed,
    }))
}

/// Create or update a bot or agent override on a package.
///
/// PATCH /v1/packages/:id/overrides/:target_type/:target_id
pub async fn patch_override(
    State(state): State<Arc<AppState>>,
    Path((package_id, target_type, target_id)): Path<(String, String, String)>,
    Json(patch): Json<OverridePatch>,
) -> Result<Json<OverrideResponse>, ApiError> {
    let package_id = parse_package_id(&package_id)?;
    let target = parse_target(&target_type, &target_id)?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest("patch sets no fields".into()));
    }
    if state.store.get_package(&package_id)?.is_none() {
        return Err(ApiError::NotFound(format!("package not found: {package_id}")));
    }

    let outcome = state
        .store
        .apply_override_patch(&target, &package_id, &patch)?;

    state.invalidate(match target {
        OverrideTarget::Bot(id) => CacheKey::Bot(id),
        OverrideTarget::Agent(id) => CacheKey::Agent(id),
    });
    let (entity_type, entity_id) = target.history_entity(&package_id);

    if outcome.changed.contains(&"unit_price") {
        state.recorder.record(
            entity_type,
            entity_id,
            outcome.before.as_ref().map(|o| o.unit_price),
            outcome.after.unit_price,
            "override_update",
            ADMIN_ACTOR,
            serde_json::json!({
                "package_id": package_id.to_string(),
                "changed": outcome.changed,
            }),
        );
    }

    tracing::info!(
        package_id = %package_id,
        target = ?target,
        changed = ?outcome.changed,
        "Override updated"
    );

    Ok(Json(OverrideResponse {
        price_override: outcome.after,
        changed: outcome.changed,
    }))
}
