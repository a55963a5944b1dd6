//! Money rounding rules.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`; every amount written to the
//! ledger passes through [`round_money`] first.

use rust_decimal::{Decimal, RoundingStrategy};

/// Tolerance below which a loan's remaining principal counts as paid off.
///
/// Repayments can leave sub-cent residue after percentage fees; anything
/// at or under this threshold is treated as zero.
pub const LOAN_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 3); // 0.001

/// Rounds a monetary amount to 2 decimal places using banker's rounding
/// (round half to even).
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if a remaining loan principal is within the payoff tolerance.
#[must_use]
pub fn is_paid_off(remaining: Decimal) -> bool {
    remaining <= LOAN_EPSILON
}
