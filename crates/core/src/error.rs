//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Evaluation itself never fails (anomalies are absorbed and reported as
/// diagnostics); this type covers the places that do validate: identifier
/// construction, instant parsing, and configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. blank).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A timestamp could not be parsed as an instant.
    #[error("invalid instant: {0:?}")]
    InvalidInstant(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_instant(raw: impl Into<String>) -> Self {
        Self::InvalidInstant(raw.into())
    }
}
