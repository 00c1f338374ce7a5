//! Validation result types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Field the finding is about.
    pub field: String,
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationIssue {
    /// Create a new finding.
    #[must_use]
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of validating an input or a breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `true` when `errors` is empty.
    pub is_valid: bool,
    /// Fatal findings.
    pub errors: Vec<ValidationIssue>,
    /// Non-fatal findings.
    pub warnings: Vec<ValidationIssue>,
    /// Advice for the caller.
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    /// An empty, valid result.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    /// Record a fatal finding.
    pub fn error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
        self.is_valid = false;
    }

    /// Record a non-fatal finding.
    pub fn warn(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Record a suggestion.
    pub fn suggest(&mut self, suggestion: impl Into<String>) {
        self.suggestions.push(suggestion.into());
    }

    /// Whether an error with the given code was recorded.
    #[must_use]
    pub fn has_error(&self, code: &str) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }

    /// Whether a warning with the given code was recorded.
    #[must_use]
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|issue| issue.code == code)
    }
}

/// Render a list of findings as a single `; `-separated line.
#[must_use]
pub fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_invalidate_but_warnings_do_not() {
        let mut result = ValidationResult::valid();
        result.warn(ValidationIssue::new("amount", "low_amount", "small"));
        assert!(result.is_valid);

        result.error(ValidationIssue::new("quantity", "quantity_zero", "must be positive"));
        assert!(!result.is_valid);
        assert!(result.has_error("quantity_zero"));
        assert!(result.has_warning("low_amount"));
    }

    #[test]
    fn join_issues_formats_fields() {
        let issues = vec![
            ValidationIssue::new("a", "x", "first"),
            ValidationIssue::new("b", "y", "second"),
        ];
        assert_eq!(join_issues(&issues), "a: first; b: second");
    }
}
