//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use energy_pricing_core::{PricingError, UserLevel, ValidationIssue};
use energy_pricing_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - malformed path or body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request failed field validation.
    #[error("invalid input")]
    InvalidInput(Vec<ValidationIssue>),

    /// Order total is over the customer tier's limit.
    #[error("spend limit exceeded: total={total}, limit={limit}")]
    SpendLimitExceeded {
        /// Customer tier.
        level: UserLevel,
        /// Order total.
        total: f64,
        /// Applicable limit.
        limit: f64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::InvalidInput(issues) => (
                StatusCode::BAD_REQUEST,
                "invalid_input",
                self.to_string(),
                Some(serde_json::json!({ "issues": issues })),
            ),
            Self::SpendLimitExceeded {
                level,
                total,
                limit,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "spend_limit_exceeded",
                self.to_string(),
                Some(serde_json::json!({
                    "level": level,
                    "total": total,
                    "limit": limit
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InputValidation { issues } => Self::InvalidInput(issues),
            PricingError::ConfigNotFound { .. } => Self::NotFound(err.to_string()),
            PricingError::SpendLimitExceeded {
                level,
                total,
                limit,
            } => Self::SpendLimitExceeded {
                level,
                total,
                limit,
            },
            PricingError::InvalidId(_) => Self::BadRequest(err.to_string()),
            PricingError::ResultInconsistency { .. }
            | PricingError::Store(_)
            | PricingError::Configuration(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::Database(msg)
            | StoreError::Serialization(msg)
            | StoreError::Unavailable(msg) => Self::Internal(msg),
        }
    }
}
