//! Fee schedule validation errors.
//!
//! Malformed schedules are rejected when the configuration is loaded,
//! never at transaction time.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors detected while validating a fee schedule.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Tier bounds are inverted (`from` > `to`).
    #[error("Tier has inverted bounds: from {from}, to {to}")]
    InvertedTier {
        /// Lower bound of the offending tier.
        from: Decimal,
        /// Upper bound of the offending tier.
        to: Decimal,
    },

    /// Two tiers overlap.
    #[error("Tiers overlap at {at}")]
    OverlappingTiers {
        /// Value contained in more than one tier.
        at: Decimal,
    },

    /// Consecutive tiers leave a gap.
    #[error("Gap between tier ending at {previous_to} and tier starting at {next_from}")]
    GappedTiers {
        /// Upper bound of the earlier tier.
        previous_to: Decimal,
        /// Lower bound of the later tier.
        next_from: Decimal,
    },

    /// A fee amount is negative.
    #[error("Fee amount cannot be negative: {0}")]
    NegativeFee(Decimal),

    /// A percentage rate is outside 0..=100.
    #[error("Percentage rate must be between 0 and 100: {0}")]
    InvalidPercent(Decimal),

    /// Conditional waiver window must be at least one day.
    #[error("Waiver window must be at least 1 day")]
    ZeroWaiverWindow,
}

impl From<ScheduleError> for cashbook_shared::EngineError {
    fn from(err: ScheduleError) -> Self {
        Self::Configuration(err.to_string())
    }
}
