//! Error types for the pricing engine.

use crate::ids::IdError;
use crate::validation::{join_issues, ValidationIssue};
use crate::{PackageId, ResourceType, UserLevel};

/// Result type for pricing operations.
pub type Result<T> = std::result::Result<T, PricingError>;

/// Errors that can occur while pricing a request.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    /// The request is malformed or out of bounds.
    #[error("invalid input: {}", join_issues(.issues))]
    InputValidation {
        /// The failing fields.
        issues: Vec<ValidationIssue>,
    },

    /// No level of the override hierarchy yields a price.
    #[error("no price configured for {resource_type} (package {package_id:?})")]
    ConfigNotFound {
        /// Resource being priced.
        resource_type: ResourceType,
        /// Requested package, if any.
        package_id: Option<PackageId>,
    },

    /// A computed breakdown violates its own invariants.
    #[error("inconsistent price breakdown: {}", join_issues(.issues))]
    ResultInconsistency {
        /// The violated invariants.
        issues: Vec<ValidationIssue>,
    },

    /// The order exceeds the customer tier's spend limit.
    #[error("spend limit exceeded for {level:?} customer: total={total}, limit={limit}")]
    SpendLimitExceeded {
        /// Customer tier.
        level: UserLevel,
        /// Order total.
        total: f64,
        /// Applicable limit.
        limit: f64,
    },

    /// Configuration store failure.
    #[error("config store error: {0}")]
    Store(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Engine configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PricingError {
    /// Whether the error is the caller's fault (maps to a 4xx response).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InputValidation { .. }
                | Self::ConfigNotFound { .. }
                | Self::SpendLimitExceeded { .. }
                | Self::InvalidId(_)
        )
    }
}
