//! Ledger validation and planning errors.

use rust_decimal::Decimal;
use thiserror::Error;

use cashbook_shared::EngineError;
use cashbook_shared::types::{AccountId, LedgerEntryId, LoanId};

use super::types::EntryStatus;

/// Errors from request validation, planning, and void operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// The request moves no money.
    #[error("Transaction moves no money")]
    NothingToDo,

    /// A leg amount is zero or negative.
    #[error("Leg amount must be positive: {0}")]
    NonPositiveAmount(Decimal),

    /// Total credit exceeds the per-transaction cap.
    #[error("Total credit {total} exceeds the per-transaction cap {cap}")]
    CreditCapExceeded {
        /// Requested credit total.
        total: Decimal,
        /// Configured cap.
        cap: Decimal,
    },

    /// Total debit exceeds the per-transaction cap.
    #[error("Total debit {total} exceeds the per-transaction cap {cap}")]
    DebitCapExceeded {
        /// Requested debit total.
        total: Decimal,
        /// Configured cap.
        cap: Decimal,
    },

    /// Transfer targets the source account.
    #[error("Transfer cannot target the source account")]
    TransferToSelf,

    /// Transfer recipient does not exist.
    #[error("Transfer recipient not found: {0}")]
    TransferTargetNotFound(AccountId),

    // ========== Decision Errors ==========
    /// The supplied shortfall loan still leaves the balance negative.
    #[error("Shortfall of {0} remains after the covering loan")]
    ShortfallNotCovered(Decimal),

    /// A repayment decision references a loan that is not open on the account.
    #[error("Loan not open on this account: {0}")]
    LoanNotOpen(LoanId),

    // ========== Void Errors ==========
    /// Entry is already voided; voiding twice would double-credit.
    #[error("Entry {0} is already voided")]
    AlreadyVoided(LedgerEntryId),

    /// Only completed entries can be voided.
    #[error("Cannot void entry in status {0:?}")]
    NotVoidable(EntryStatus),
}

impl LedgerError {
    /// Returns the error code for API responses and audit logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NothingToDo => "NOTHING_TO_DO",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::CreditCapExceeded { .. } => "CREDIT_CAP_EXCEEDED",
            Self::DebitCapExceeded { .. } => "DEBIT_CAP_EXCEEDED",
            Self::TransferToSelf => "TRANSFER_TO_SELF",
            Self::TransferTargetNotFound(_) => "TRANSFER_TARGET_NOT_FOUND",
            Self::ShortfallNotCovered(_) => "SHORTFALL_NOT_COVERED",
            Self::LoanNotOpen(_) => "LOAN_NOT_OPEN",
            Self::AlreadyVoided(_) => "ALREADY_VOIDED",
            Self::NotVoidable(_) => "NOT_VOIDABLE",
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ShortfallNotCovered(amount) => Self::InsufficientFunds(amount),
            LedgerError::TransferTargetNotFound(id) => Self::NotFound(format!("account {id}")),
            other => Self::Validation(other.to_string()),
        }
    }
}
