//! Loan operation errors.

use rust_decimal::Decimal;
use thiserror::Error;

use cashbook_shared::types::LoanId;

/// Errors from loan operations.
#[derive(Debug, Error)]
pub enum LoanError {
    /// Loan principal must be positive.
    #[error("Loan amount must be positive: {0}")]
    NonPositiveAmount(Decimal),

    /// Repayment must be positive.
    #[error("Repayment amount must be positive: {0}")]
    NonPositivePayment(Decimal),

    /// Repayment targets a loan that is already paid.
    #[error("Loan {0} is already paid")]
    AlreadyPaid(LoanId),
}

impl From<LoanError> for cashbook_shared::EngineError {
    fn from(err: LoanError) -> Self {
        Self::Validation(err.to_string())
    }
}
