//! Storage abstraction.
//!
//! `LedgerStore` is the seam between planning and persistence. Reads are
//! individual lookups; writes go through exactly one method, `apply`,
//! which takes a whole `CommitBatch` and persists it atomically or not at
//! all. That single write path is what makes the engine's atomicity
//! guarantee a store property instead of a calling-convention.

mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use cashbook_core::hold::{Check, CheckStatus};
use cashbook_core::ledger::{Account, EntryStatus, LedgerEntry, NewEntry};
use cashbook_core::loan::{Loan, LoanStatus};
use cashbook_shared::EngineResult;
use cashbook_shared::types::{AccountId, CheckId, LedgerEntryId, LoanId};

pub use memory::MemoryStore;

/// Status/audit update to an existing ledger entry (voids).
#[derive(Debug, Clone)]
pub struct EntryUpdate {
    /// The entry to update.
    pub entry_id: LedgerEntryId,
    /// New status.
    pub status: EntryStatus,
    /// Audit note recorded alongside the status change.
    pub audit_note: Option<String>,
}

/// Cleared-amount/status update to an existing check (hold placement and
/// releases).
#[derive(Debug, Clone)]
pub struct CheckUpdate {
    /// The check to update.
    pub check_id: CheckId,
    /// New cleared amount.
    pub cleared_amount: Decimal,
    /// New status.
    pub status: CheckStatus,
    /// Tags to add to the check's tag set.
    pub add_tags: std::collections::BTreeSet<String>,
}

/// Principal/status update to an existing loan (repayments).
#[derive(Debug, Clone)]
pub struct LoanUpdate {
    /// The loan to update.
    pub loan_id: LoanId,
    /// New remaining principal.
    pub amount: Decimal,
    /// New status.
    pub status: LoanStatus,
}

/// One atomic unit of state change.
///
/// Everything a committed transaction, void, hold release, or loan
/// operation touches travels together; the store applies the whole batch
/// or rejects the whole batch.
#[derive(Debug, Clone, Default)]
pub struct CommitBatch {
    /// New ledger entries; the store assigns ids and timestamps.
    pub entries: Vec<NewEntry>,
    /// Updates to existing entries.
    pub entry_updates: Vec<EntryUpdate>,
    /// Net balance change per account.
    pub balance_deltas: BTreeMap<AccountId, Decimal>,
    /// New check records.
    pub new_checks: Vec<Check>,
    /// Updates to existing checks.
    pub check_updates: Vec<CheckUpdate>,
    /// New loans.
    pub new_loans: Vec<Loan>,
    /// Updates to existing loans.
    pub loan_updates: Vec<LoanUpdate>,
}

impl CommitBatch {
    /// True if applying this batch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.entry_updates.is_empty()
            && self.balance_deltas.values().all(|d| d.is_zero())
            && self.new_checks.is_empty()
            && self.check_updates.is_empty()
            && self.new_loans.is_empty()
            && self.loan_updates.is_empty()
    }
}

/// Durable ledger state behind the engine.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fetches an account by id.
    async fn account(&self, id: AccountId) -> EngineResult<Account>;

    /// Looks up an account by its number.
    async fn account_by_number(&self, number: &str) -> EngineResult<Option<Account>>;

    /// Fetches a ledger entry by id.
    async fn entry(&self, id: LedgerEntryId) -> EngineResult<LedgerEntry>;

    /// All ledger entries for an account, oldest first.
    async fn entries_for_account(&self, account_id: AccountId) -> EngineResult<Vec<LedgerEntry>>;

    /// Fetches a loan by id.
    async fn loan(&self, id: LoanId) -> EngineResult<Loan>;

    /// Open (active or overdue) loans for an account.
    async fn open_loans(&self, account_id: AccountId) -> EngineResult<Vec<Loan>>;

    /// Fetches a check by id.
    async fn check(&self, id: CheckId) -> EngineResult<Check>;

    /// All check records for an account.
    async fn checks_for_account(&self, account_id: AccountId) -> EngineResult<Vec<Check>>;

    /// All check records carrying a tag, across accounts, oldest deposit
    /// first.
    async fn checks_by_tag(&self, tag: &str) -> EngineResult<Vec<Check>>;

    /// Sum of the account's debit-side legs since `since`, voided entries
    /// excluded. Feeds the fee waiver condition.
    async fn trailing_debit_sum(
        &self,
        account_id: AccountId,
        since: DateTime<Utc>,
    ) -> EngineResult<Decimal>;

    /// Applies a batch atomically, returning the created entries with
    /// their assigned ids and timestamps.
    ///
    /// A failed apply must leave the store exactly as it was.
    async fn apply(&self, batch: CommitBatch) -> EngineResult<Vec<LedgerEntry>>;
}
