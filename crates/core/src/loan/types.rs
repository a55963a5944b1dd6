//! Loan domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashbook_shared::types::{AccountId, LoanId};

/// Loan lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Outstanding and not past due.
    Active,
    /// Outstanding and past due.
    Overdue,
    /// Fully repaid; `amount` is zero.
    Paid,
}

impl LoanStatus {
    /// Returns true if the loan still has principal outstanding.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Active | Self::Overdue)
    }
}

/// A loan against a cash account.
///
/// `amount` is the remaining principal and only ever decreases; it never
/// goes negative. Status flips to `Paid` exactly when the remainder falls
/// within the payoff tolerance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Unique identifier.
    pub id: LoanId,
    /// The borrowing account.
    pub account_id: AccountId,
    /// Remaining principal.
    pub amount: Decimal,
    /// Date the loan falls due.
    pub due_date: NaiveDate,
    /// Lifecycle status.
    pub status: LoanStatus,
}

impl Loan {
    /// Creates a new active loan.
    #[must_use]
    pub fn new(account_id: AccountId, amount: Decimal, due_date: NaiveDate) -> Self {
        Self {
            id: LoanId::new(),
            account_id,
            amount,
            due_date,
            status: LoanStatus::Active,
        }
    }
}

/// Caller decision for repayment excess when other loans are still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverpaymentDecision {
    /// Apply the excess to the account's next open loan (one hop; excess
    /// past that hop goes to the balance).
    ApplyToNextLoan,
    /// Leave the excess on the account balance.
    AddToBalance,
}
