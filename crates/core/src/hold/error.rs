//! Hold operation errors.

use rust_decimal::Decimal;
use thiserror::Error;

use cashbook_shared::types::CheckId;

/// Errors from hold operations.
#[derive(Debug, Error)]
pub enum HoldError {
    /// Release budget must be positive.
    #[error("Release amount must be positive: {0}")]
    NonPositiveAmount(Decimal),

    /// A hold can only be placed on a pending or already-held deposit.
    #[error("Check {0} cannot be placed on hold in its current status")]
    NotHoldable(CheckId),

    /// The check is not a deposited check.
    #[error("Check {0} is not a deposited check")]
    NotADeposit(CheckId),

    /// Only pending, held, or cleared deposits can bounce.
    #[error("Check {0} cannot bounce in its current status")]
    NotBounceable(CheckId),
}

impl From<HoldError> for cashbook_shared::EngineError {
    fn from(err: HoldError) -> Self {
        Self::Validation(err.to_string())
    }
}
