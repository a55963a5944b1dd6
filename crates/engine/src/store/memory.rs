//! In-memory store.
//!
//! Backs the demo binary and the engine tests. All state lives behind one
//! mutex, so `apply` is trivially atomic: the batch is validated in full
//! before the first mutation, and a validation failure returns with the
//! store untouched.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use cashbook_core::hold::Check;
use cashbook_core::ledger::{Account, EntryStatus, LedgerEntry, LegKind};
use cashbook_core::loan::Loan;
use cashbook_shared::types::{AccountId, CheckId, LedgerEntryId, LoanId};
use cashbook_shared::{EngineError, EngineResult};

use super::{CommitBatch, LedgerStore};

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    numbers: HashMap<String, AccountId>,
    entries: HashMap<LedgerEntryId, LedgerEntry>,
    loans: HashMap<LoanId, Loan>,
    checks: HashMap<CheckId, Check>,
}

/// In-memory `LedgerStore`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_next_apply: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account and returns it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the account number is taken.
    pub fn insert_account(
        &self,
        number: &str,
        parent_number: Option<&str>,
        balance: Decimal,
    ) -> EngineResult<Account> {
        let mut inner = self.lock()?;
        if inner.numbers.contains_key(number) {
            return Err(EngineError::Validation(format!(
                "account number {number} already exists"
            )));
        }
        let account = Account {
            id: AccountId::new(),
            number: number.to_string(),
            parent_number: parent_number.map(ToString::to_string),
            balance,
        };
        inner.numbers.insert(number.to_string(), account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Seeds a loan record directly (test/demo setup).
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn insert_loan(&self, loan: Loan) -> EngineResult<()> {
        self.lock()?.loans.insert(loan.id, loan);
        Ok(())
    }

    /// Seeds a check record directly (test/demo setup).
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn insert_check(&self, check: Check) -> EngineResult<()> {
        self.lock()?.checks.insert(check.id, check);
        Ok(())
    }

    /// Makes the next `apply` fail with a persistence error, applying
    /// nothing. Exercises the all-or-nothing commit guarantee.
    pub fn fail_next_apply(&self) {
        self.fail_next_apply.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> EngineResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| EngineError::Internal("store lock poisoned".to_string()))
    }

    fn validate_batch(inner: &Inner, batch: &CommitBatch) -> EngineResult<()> {
        for entry in &batch.entries {
            if !inner.accounts.contains_key(&entry.account_id) {
                return Err(EngineError::NotFound(format!(
                    "account {}",
                    entry.account_id
                )));
            }
        }
        for account_id in batch.balance_deltas.keys() {
            if !inner.accounts.contains_key(account_id) {
                return Err(EngineError::NotFound(format!("account {account_id}")));
            }
        }
        for update in &batch.entry_updates {
            if !inner.entries.contains_key(&update.entry_id) {
                return Err(EngineError::NotFound(format!("entry {}", update.entry_id)));
            }
        }
        for update in &batch.check_updates {
            if !inner.checks.contains_key(&update.check_id) {
                return Err(EngineError::NotFound(format!("check {}", update.check_id)));
            }
        }
        for update in &batch.loan_updates {
            if !inner.loans.contains_key(&update.loan_id) {
                return Err(EngineError::NotFound(format!("loan {}", update.loan_id)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn account(&self, id: AccountId) -> EngineResult<Account> {
        self.lock()?
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("account {id}")))
    }

    async fn account_by_number(&self, number: &str) -> EngineResult<Option<Account>> {
        let inner = self.lock()?;
        Ok(inner
            .numbers
            .get(number)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn entry(&self, id: LedgerEntryId) -> EngineResult<LedgerEntry> {
        self.lock()?
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("entry {id}")))
    }

    async fn entries_for_account(&self, account_id: AccountId) -> EngineResult<Vec<LedgerEntry>> {
        let mut entries: Vec<LedgerEntry> = self
            .lock()?
            .entries
            .values()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.timestamp, e.id));
        Ok(entries)
    }

    async fn loan(&self, id: LoanId) -> EngineResult<Loan> {
        self.lock()?
            .loans
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("loan {id}")))
    }

    async fn open_loans(&self, account_id: AccountId) -> EngineResult<Vec<Loan>> {
        let mut loans: Vec<Loan> = self
            .lock()?
            .loans
            .values()
            .filter(|l| l.account_id == account_id && l.status.is_open())
            .cloned()
            .collect();
        loans.sort_by_key(|l| (l.due_date, l.id));
        Ok(loans)
    }

    async fn check(&self, id: CheckId) -> EngineResult<Check> {
        self.lock()?
            .checks
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("check {id}")))
    }

    async fn checks_for_account(&self, account_id: AccountId) -> EngineResult<Vec<Check>> {
        let mut checks: Vec<Check> = self
            .lock()?
            .checks
            .values()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect();
        checks.sort_by_key(|c| (c.deposit_date, c.id));
        Ok(checks)
    }

    async fn checks_by_tag(&self, tag: &str) -> EngineResult<Vec<Check>> {
        let mut checks: Vec<Check> = self
            .lock()?
            .checks
            .values()
            .filter(|c| c.has_tag(tag))
            .cloned()
            .collect();
        checks.sort_by_key(|c| (c.deposit_date, c.id));
        Ok(checks)
    }

    async fn trailing_debit_sum(
        &self,
        account_id: AccountId,
        since: DateTime<Utc>,
    ) -> EngineResult<Decimal> {
        Ok(self
            .lock()?
            .entries
            .values()
            .filter(|e| {
                e.account_id == account_id
                    && e.timestamp >= since
                    && e.status != EntryStatus::Voided
                    && matches!(e.kind, LegKind::Debit | LegKind::Fee | LegKind::TransferOut)
            })
            .map(|e| e.amount)
            .sum())
    }

    async fn apply(&self, batch: CommitBatch) -> EngineResult<Vec<LedgerEntry>> {
        if self.fail_next_apply.swap(false, Ordering::SeqCst) {
            return Err(EngineError::Persistence(
                "injected store failure".to_string(),
            ));
        }

        let mut inner = self.lock()?;
        Self::validate_batch(&inner, &batch)?;

        let now = Utc::now();
        let mut created = Vec::with_capacity(batch.entries.len());
        for new in batch.entries {
            let entry = LedgerEntry {
                id: LedgerEntryId::new(),
                account_id: new.account_id,
                kind: new.kind,
                amount: new.amount,
                timestamp: now,
                status: new.status,
                related_loan: new.related_loan,
                memo: new.memo,
                audit: new.audit,
            };
            inner.entries.insert(entry.id, entry.clone());
            created.push(entry);
        }

        for update in batch.entry_updates {
            if let Some(entry) = inner.entries.get_mut(&update.entry_id) {
                entry.status = update.status;
                if let Some(note) = update.audit_note {
                    match entry.audit.as_object_mut() {
                        Some(map) => {
                            map.insert("void_note".to_string(), serde_json::json!(note));
                        }
                        None => entry.audit = serde_json::json!({ "void_note": note }),
                    }
                }
            }
        }

        for (account_id, delta) in batch.balance_deltas {
            if let Some(account) = inner.accounts.get_mut(&account_id) {
                account.balance += delta;
            }
        }

        for check in batch.new_checks {
            inner.checks.insert(check.id, check);
        }
        for update in batch.check_updates {
            if let Some(check) = inner.checks.get_mut(&update.check_id) {
                check.cleared_amount = update.cleared_amount;
                check.status = update.status;
                check.tags.extend(update.add_tags);
            }
        }

        for loan in batch.new_loans {
            inner.loans.insert(loan.id, loan);
        }
        for update in batch.loan_updates {
            if let Some(loan) = inner.loans.get_mut(&update.loan_id) {
                loan.amount = update.amount;
                loan.status = update.status;
            }
        }

        Ok(created)
    }
}
