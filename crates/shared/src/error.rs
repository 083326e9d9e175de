//! Application-wide error types.

use std::collections::BTreeMap;

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Field-keyed validation messages, e.g. `{"ncf": ["ya está en uso"]}`.
///
/// A `BTreeMap` keeps serialization order stable for clients and tests.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error attributed to specific input fields.
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Business rule violation (well-formed input, rejected semantics).
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Invariant violation: internal state the system promised could not
    /// occur. Logged, never surfaced verbatim to end users.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a validation error for a single field.
    #[must_use]
    pub fn field(field: &str, message: &str) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.to_string()]);
        Self::Validation(fields)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Invariant(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Invariant(_) => "INVARIANT_VIOLATION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), 404);
        assert_eq!(AppError::field("ncf", "bad").status_code(), 400);
        assert_eq!(AppError::BusinessRule("x".into()).status_code(), 422);
        assert_eq!(AppError::Conflict("x".into()).status_code(), 409);
        assert_eq!(AppError::Invariant("x".into()).status_code(), 500);
    }

    #[test]
    fn error_codes() {
        assert_eq!(AppError::NotFound("x".into()).error_code(), "NOT_FOUND");
        assert_eq!(
            AppError::field("a", "b").error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::Invariant("x".into()).error_code(),
            "INVARIANT_VIOLATION"
        );
    }

    #[test]
    fn field_helper_builds_single_entry_map() {
        let AppError::Validation(fields) = AppError::field("ncf", "ya está en uso") else {
            panic!("expected validation variant");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["ncf"], vec!["ya está en uso".to_string()]);
    }
}
