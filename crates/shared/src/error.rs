//! Engine-wide error taxonomy.
//!
//! Validation problems and insufficient funds are expected flows surfaced
//! to the caller verbatim; persistence and concurrency failures are
//! retryable because no partial state survives a failed commit.

use thiserror::Error;

/// Result type alias using `EngineError`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad input; no state change, caller-fixable.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Prospective balance would go negative and the caller refused or
    /// failed to supply a shortfall decision.
    #[error("Insufficient funds: shortfall of {0}")]
    InsufficientFunds(rust_decimal::Decimal),

    /// Another mutation on the same account is in flight.
    #[error("Concurrent modification detected, please retry")]
    ConcurrencyConflict,

    /// The durable store failed mid-commit; the whole commit was rolled
    /// back and the identical request may be retried safely.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Malformed configuration (e.g. overlapping or gapped fee tiers),
    /// caught at schedule-load time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Returns the error code for API responses and audit logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::Persistence(_) => "PERSISTENCE_FAILURE",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the identical request may be retried safely.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict | Self::Persistence(_))
    }
}
