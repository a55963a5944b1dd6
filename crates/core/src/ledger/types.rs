//! Ledger domain types.
//!
//! A user action becomes a `TransactionRequest`; planning turns it into an
//! explicit set of typed legs. Direction is encoded by `LegKind` and every
//! amount is positive.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashbook_shared::types::{AccountId, LedgerEntryId, LoanId};

use crate::loan::Loan;

/// Type of ledger leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    /// Money into the account.
    Credit,
    /// Money out of the account.
    Debit,
    /// Fee charged against the account.
    Fee,
    /// Transfer leg on the source account.
    TransferOut,
    /// Mirrored transfer leg on the recipient account.
    TransferIn,
}

/// Ledger entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Recorded but not yet settled.
    Pending,
    /// Settled; contributes to the account balance.
    Completed,
    /// Returned unpaid; recorded by the clearing feed. Voids refuse it.
    Bounced,
    /// Reversed by an equal-and-opposite adjustment; never deleted.
    Voided,
}

/// A single ledger entry (one leg of a transaction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier.
    pub id: LedgerEntryId,
    /// The account affected.
    pub account_id: AccountId,
    /// Direction and role of this leg.
    pub kind: LegKind,
    /// Amount; always positive, direction lives in `kind`.
    pub amount: Decimal,
    /// When the leg was committed.
    pub timestamp: DateTime<Utc>,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Loan this leg disburses or repays, if any.
    pub related_loan: Option<LoanId>,
    /// Human-readable memo.
    pub memo: String,
    /// Structured audit details (fee breakdowns, void reasons, ...).
    pub audit: serde_json::Value,
}

impl LedgerEntry {
    /// Signed effect of this leg on its account's balance.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            LegKind::Credit | LegKind::TransferIn => self.amount,
            LegKind::Debit | LegKind::Fee | LegKind::TransferOut => -self.amount,
        }
    }
}

/// A customer cash account.
///
/// A sub-account references its parent by number; its balance is
/// independent and aggregation happens only at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Unique account number.
    pub number: String,
    /// Parent account number for sub-accounts.
    pub parent_number: Option<String>,
    /// Current balance: the sum of all non-voided completed legs.
    pub balance: Decimal,
}

/// A check being deposited as part of a transaction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDeposit {
    /// Face amount.
    pub amount: Decimal,
    /// Printed check number.
    pub check_number: String,
    /// Counterparty account reference; `None` triggers the
    /// missing-account fee rule.
    pub counterparty_account: Option<String>,
    /// Withhold the funds pending risk review instead of crediting now.
    pub on_hold: bool,
    /// Tags grouping the hold for batched release.
    pub hold_tags: Vec<String>,
}

/// A check being drawn against the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckWithdrawal {
    /// Face amount.
    pub amount: Decimal,
    /// Printed check number.
    pub check_number: String,
    /// Whether this is a reprint of an existing check document.
    pub reprint: bool,
}

/// Transfer leg of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLeg {
    /// Recipient account.
    pub to_account: AccountId,
    /// Amount to move.
    pub amount: Decimal,
}

/// A user's requested movement of money; every field defaults to
/// zero/empty so callers fill in only the legs they need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// The source account.
    pub account_id: AccountId,
    /// Cash deposited.
    pub credit_cash: Decimal,
    /// Checks deposited.
    pub credit_checks: Vec<CheckDeposit>,
    /// Cash withdrawal amounts.
    pub debit_cash: Vec<Decimal>,
    /// Checks drawn.
    pub debit_checks: Vec<CheckWithdrawal>,
    /// Optional transfer to another account.
    pub transfer: Option<TransferLeg>,
    /// Whether the computed fee is charged.
    pub apply_fee: bool,
    /// Expedited processing requested.
    pub is_rush: bool,
}

impl TransactionRequest {
    /// Total requested credit, holds included.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.credit_cash + self.credit_checks.iter().map(|c| c.amount).sum::<Decimal>()
    }

    /// Credit that lands on the balance now (held checks excluded).
    #[must_use]
    pub fn available_credit(&self) -> Decimal {
        self.credit_cash
            + self
                .credit_checks
                .iter()
                .filter(|c| !c.on_hold)
                .map(|c| c.amount)
                .sum::<Decimal>()
    }

    /// Total requested debit, the transfer included.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.debit_cash.iter().copied().sum::<Decimal>()
            + self.debit_checks.iter().map(|c| c.amount).sum::<Decimal>()
            + self.transfer.as_ref().map_or(Decimal::ZERO, |t| t.amount)
    }

    /// Sum of the cash debit legs (the fee rule input).
    #[must_use]
    pub fn cash_debit_total(&self) -> Decimal {
        self.debit_cash.iter().copied().sum()
    }

    /// True if the request moves no money at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_credit() == Decimal::ZERO
            && self.total_debit() == Decimal::ZERO
            && self.transfer.is_none()
    }
}

/// Snapshot of the account state planning works against.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    /// The source account.
    pub account: Account,
    /// The account's open loans.
    pub open_loans: Vec<Loan>,
    /// Debit activity over the waiver window, voided entries excluded.
    pub trailing_debit_sum: Decimal,
}

/// Caller decision for a detected shortfall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortfallDecision {
    /// Create a loan covering the gap; amount is the caller's choice
    /// (the shortfall or the full debit).
    CoverWithLoan {
        /// Loan principal.
        amount: Decimal,
        /// Loan due date.
        due_date: NaiveDate,
    },
}

/// Caller decision for a repayment offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentDecision {
    /// Route the incoming credit to this loan.
    RepayLoan(LoanId),
    /// Leave the credit on the balance.
    ToBalance,
}

/// Caller decisions folded into the second planning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decisions {
    /// How to handle a detected shortfall.
    pub shortfall: Option<ShortfallDecision>,
    /// How to route incoming credit when open loans exist.
    pub repayment: Option<RepaymentDecision>,
}

/// A decision the caller must make before the transaction can commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDecision {
    /// Committing as requested would take the balance negative by this amount.
    Shortfall {
        /// The gap to cover.
        amount: Decimal,
    },
    /// Incoming credit while this loan is open; the caller chooses where
    /// the money goes.
    RepaymentOffer {
        /// The account's oldest open loan.
        loan: Loan,
    },
}

/// A planned leg, before the engine assigns an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// The account affected.
    pub account_id: AccountId,
    /// Direction and role.
    pub kind: LegKind,
    /// Positive amount.
    pub amount: Decimal,
    /// Status at commit.
    pub status: EntryStatus,
    /// Related loan, if any.
    pub related_loan: Option<LoanId>,
    /// Memo.
    pub memo: String,
    /// Structured audit details.
    pub audit: serde_json::Value,
}

/// Loan side effects a plan carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanAction {
    /// Create a loan (shortfall cover or explicit disbursement).
    Create(Loan),
    /// Apply this amount to an existing loan.
    Repay {
        /// The loan being repaid.
        loan_id: LoanId,
        /// Amount applied.
        amount: Decimal,
    },
}
