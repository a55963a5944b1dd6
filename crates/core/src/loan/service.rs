//! Loan repayment math.
//!
//! The service is stateless; it computes what should happen to a loan and
//! hands the caller the numbers to persist. Overpayment cascades are one
//! hop: excess is offered against the next open loan, and anything left
//! after that hop degrades to a balance credit.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use cashbook_shared::types::{LoanId, is_paid_off};

use super::error::LoanError;
use super::types::{Loan, LoanStatus};

/// Result of applying a payment to a single loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepaymentSplit {
    /// Amount actually applied to the loan (`min(payment, remaining)`).
    pub applied: Decimal,
    /// Payment left over after the loan was satisfied.
    pub excess: Decimal,
    /// Remaining principal after the payment, clamped at zero.
    pub remaining: Decimal,
    /// Whether the payment settled the loan.
    pub paid_off: bool,
}

/// Stateless loan math.
pub struct LoanService;

impl LoanService {
    /// Validates the principal for a new loan.
    ///
    /// # Errors
    ///
    /// Returns `LoanError::NonPositiveAmount` if `amount <= 0`.
    pub fn validate_principal(amount: Decimal) -> Result<(), LoanError> {
        if amount <= Decimal::ZERO {
            return Err(LoanError::NonPositiveAmount(amount));
        }
        Ok(())
    }

    /// Splits a payment against a loan.
    ///
    /// `applied + excess == payment` always holds; the remainder is
    /// clamped at zero and snapped to zero within the payoff tolerance.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive payments or an already-paid loan.
    pub fn apply_repayment(loan: &Loan, payment: Decimal) -> Result<RepaymentSplit, LoanError> {
        if payment <= Decimal::ZERO {
            return Err(LoanError::NonPositivePayment(payment));
        }
        if !loan.status.is_open() {
            return Err(LoanError::AlreadyPaid(loan.id));
        }

        let applied = payment.min(loan.amount);
        let excess = payment - applied;
        let remaining = (loan.amount - applied).max(Decimal::ZERO);
        let paid_off = is_paid_off(remaining);

        Ok(RepaymentSplit {
            applied,
            excess,
            remaining: if paid_off { Decimal::ZERO } else { remaining },
            paid_off,
        })
    }

    /// Picks the next open loan for an overpayment cascade: oldest due
    /// date first, excluding the loan just paid. Ties break on id so the
    /// choice is deterministic.
    #[must_use]
    pub fn next_open_loan<'a>(loans: &'a [Loan], exclude: LoanId) -> Option<&'a Loan> {
        loans
            .iter()
            .filter(|l| l.id != exclude && l.status.is_open())
            .min_by_key(|l| (l.due_date, l.id))
    }

    /// Derives the status a loan should carry as of `today`.
    ///
    /// Paid loans stay paid; open loans flip between active and overdue
    /// based on the due date.
    #[must_use]
    pub fn status_as_of(loan: &Loan, today: NaiveDate) -> LoanStatus {
        if loan.status == LoanStatus::Paid {
            LoanStatus::Paid
        } else if loan.due_date < today {
            LoanStatus::Overdue
        } else {
            LoanStatus::Active
        }
    }
}
