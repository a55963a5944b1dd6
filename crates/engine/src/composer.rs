//! The transaction composer: two-phase submit, voids, hold placement and
//! releases, and loan operations, serialized per account.
//!
//! Mutations on one account never interleave: every mutating operation
//! takes the account's async mutex before reading state, and a transfer
//! takes both account locks in ascending id order so two opposing
//! transfers cannot deadlock.
//!
//! Submit is two-phase. `propose` plans against a snapshot, parks the
//! request in a TTL cache, and reports any decision the caller owes;
//! `commit` folds the caller's decisions in, re-plans under the account
//! lock (the snapshot may be stale by then), and applies the resulting
//! batch in one atomic store write. An abandoned proposal simply ages
//! out; nothing was written.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use moka::sync::Cache;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use cashbook_core::fees::{FeeBreakdown, FeeSchedule, WaiverPolicy};
use cashbook_core::hold::{Check, HoldService, ReleasePlan};
use cashbook_core::ledger::{
    AccountSnapshot, Decisions, EntryStatus, LedgerEntry, LegKind, LoanAction, NewEntry,
    PendingDecision, PlanContext, PlanOutcome, Planner, TransactionPlan, TransactionRequest,
    plan_void,
};
use cashbook_core::loan::{Loan, LoanService, LoanStatus, OverpaymentDecision};
use cashbook_shared::types::{AccountId, CheckId, LedgerEntryId, LoanId, ProposalId};
use cashbook_shared::{EngineConfig, EngineError, EngineResult};

use crate::store::{CheckUpdate, CommitBatch, EntryUpdate, LedgerStore, LoanUpdate};

/// A parked request awaiting commit.
#[derive(Debug, Clone)]
struct Proposal {
    request: TransactionRequest,
}

/// What `propose` tells the caller about a ready plan.
#[derive(Debug, Clone)]
pub struct ProposalSummary {
    /// Handle for the later `commit` call.
    pub proposal_id: ProposalId,
    /// The fee as computed at proposal time.
    pub fee: FeeBreakdown,
    /// The source account's balance if committed against the current state.
    pub projected_balance: Decimal,
}

/// Result of a propose call. The request is parked in both cases; commit
/// supplies the decisions.
#[derive(Debug, Clone)]
pub enum ProposeOutcome {
    /// The caller owes a decision before this proposal can commit.
    NeedsDecision {
        /// Handle for the later `commit` call.
        proposal_id: ProposalId,
        /// The decision being requested.
        decision: PendingDecision,
    },
    /// No decision outstanding.
    Ready(ProposalSummary),
}

impl ProposeOutcome {
    /// The proposal handle, whichever arm this is.
    #[must_use]
    pub fn proposal_id(&self) -> ProposalId {
        match self {
            Self::NeedsDecision { proposal_id, .. } => *proposal_id,
            Self::Ready(summary) => summary.proposal_id,
        }
    }
}

/// Result of a committed transaction.
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    /// The entries created, with assigned ids and timestamps.
    pub entries: Vec<LedgerEntry>,
    /// The source account's balance after commit.
    pub new_balance: Decimal,
    /// The fee computation that was applied (or previewed, when not charged).
    pub fee: FeeBreakdown,
}

/// Result of voiding an entry.
#[derive(Debug, Clone)]
pub struct VoidReceipt {
    /// The voided entry.
    pub entry_id: LedgerEntryId,
    /// Signed balance adjustment that was applied.
    pub adjustment: Decimal,
    /// The account's balance after the void.
    pub new_balance: Decimal,
}

/// Result of bouncing a check.
#[derive(Debug, Clone)]
pub struct BounceReceipt {
    /// The bounced check.
    pub check_id: CheckId,
    /// Previously released funds clawed back from the balance.
    pub reversal: Decimal,
    /// The account's balance after the bounce.
    pub new_balance: Decimal,
}

/// Result of an explicit loan repayment.
#[derive(Debug, Clone)]
pub struct RepaymentReceipt {
    /// Amount applied per loan, in application order.
    pub applied: Vec<(LoanId, Decimal)>,
    /// Payment portion that stayed on the balance.
    pub left_on_balance: Decimal,
    /// The account's balance after the repayment.
    pub new_balance: Decimal,
}

/// Orchestrates all mutations against a `LedgerStore`.
pub struct TransactionComposer<S> {
    store: Arc<S>,
    schedule: RwLock<FeeSchedule>,
    config: EngineConfig,
    proposals: Cache<ProposalId, Arc<Proposal>>,
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl<S: LedgerStore> TransactionComposer<S> {
    /// Creates a composer over a store with a validated fee schedule.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the schedule is malformed.
    pub fn new(store: Arc<S>, schedule: FeeSchedule, config: EngineConfig) -> EngineResult<Self> {
        schedule.validate()?;
        let proposals = Cache::builder()
            .time_to_live(Duration::from_secs(config.proposal_ttl_secs))
            .build();
        Ok(Self {
            store,
            schedule: RwLock::new(schedule),
            config,
            proposals,
            locks: DashMap::new(),
        })
    }

    /// Swaps in a new fee schedule after validating it. In-flight
    /// proposals commit against the schedule active at commit time.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the schedule is malformed; the
    /// active schedule is left untouched.
    pub fn reload_schedule(&self, schedule: FeeSchedule) -> EngineResult<()> {
        schedule.validate()?;
        let mut active = self
            .schedule
            .write()
            .map_err(|_| EngineError::Internal("schedule lock poisoned".to_string()))?;
        *active = schedule;
        tracing::info!("fee schedule reloaded");
        Ok(())
    }

    /// Phase 1: plans a transaction without committing anything.
    ///
    /// Validates the request, computes the fee, and detects decision
    /// points. The request is parked either way and stays valid for the
    /// configured TTL; nothing is locked or written while the caller
    /// decides.
    ///
    /// # Errors
    ///
    /// Returns validation errors or store errors from the snapshot reads.
    pub async fn propose(&self, request: TransactionRequest) -> EngineResult<ProposeOutcome> {
        let schedule = self.active_schedule()?;
        let snapshot = self.snapshot(request.account_id, &schedule).await?;
        let target = self.resolve_transfer_target(&request).await?;

        let ctx = PlanContext {
            snapshot: &snapshot,
            transfer_target: target.as_ref(),
            schedule: &schedule,
            config: &self.config,
            today: Utc::now().date_naive(),
        };
        let outcome = Planner::plan(&request, &ctx, &Decisions::default())?;

        let proposal_id = ProposalId::new();
        self.proposals
            .insert(proposal_id, Arc::new(Proposal { request }));

        match outcome {
            PlanOutcome::NeedsDecision(decision) => {
                tracing::debug!(%proposal_id, ?decision, "proposal parked awaiting a decision");
                Ok(ProposeOutcome::NeedsDecision {
                    proposal_id,
                    decision,
                })
            }
            PlanOutcome::Ready(plan) => {
                tracing::info!(%proposal_id, fee = %plan.fee.total, "proposal parked");
                Ok(ProposeOutcome::Ready(ProposalSummary {
                    proposal_id,
                    fee: plan.fee,
                    projected_balance: plan.new_balance,
                }))
            }
        }
    }

    /// Phase 2: commits a parked proposal with the caller's decisions
    /// folded in.
    ///
    /// The request is re-planned under the account lock; the store then
    /// applies every leg, check record, loan action, and balance change
    /// as one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an expired or unknown proposal id, a
    /// validation error when a decision is (still) outstanding, or any
    /// error from the atomic store apply. On every error path the
    /// proposal is parked again, so the caller can retry or supply
    /// different decisions.
    pub async fn commit(
        &self,
        proposal_id: ProposalId,
        decisions: Decisions,
    ) -> EngineResult<CommitReceipt> {
        // Taking the proposal out of the cache makes a concurrent commit
        // of the same id fail with NotFound instead of applying twice.
        let proposal = self.proposals.remove(&proposal_id).ok_or_else(|| {
            EngineError::NotFound(format!("proposal {proposal_id} (expired or unknown)"))
        })?;

        let result = self.commit_inner(&proposal.request, &decisions).await;
        match result {
            Ok(receipt) => {
                tracing::info!(
                    %proposal_id,
                    account = %proposal.request.account_id,
                    legs = receipt.entries.len(),
                    fee = %receipt.fee.total,
                    new_balance = %receipt.new_balance,
                    "transaction committed"
                );
                Ok(receipt)
            }
            Err(err) => {
                // Nothing was written; park the proposal again so the
                // caller can retry or revise the decisions.
                self.proposals.insert(proposal_id, proposal);
                Err(err)
            }
        }
    }

    async fn commit_inner(
        &self,
        request: &TransactionRequest,
        decisions: &Decisions,
    ) -> EngineResult<CommitReceipt> {
        let mut accounts = vec![request.account_id];
        if let Some(transfer) = &request.transfer {
            accounts.push(transfer.to_account);
        }
        let _guards = self.lock_accounts(accounts).await;

        let schedule = self.active_schedule()?;
        let snapshot = self.snapshot(request.account_id, &schedule).await?;
        let target = self.resolve_transfer_target(request).await?;

        let ctx = PlanContext {
            snapshot: &snapshot,
            transfer_target: target.as_ref(),
            schedule: &schedule,
            config: &self.config,
            today: Utc::now().date_naive(),
        };

        let plan = match Planner::plan(request, &ctx, decisions)? {
            PlanOutcome::Ready(plan) => *plan,
            PlanOutcome::NeedsDecision(decision) => {
                return Err(EngineError::Validation(match decision {
                    PendingDecision::Shortfall { amount } => {
                        format!("shortfall of {amount} requires a decision")
                    }
                    PendingDecision::RepaymentOffer { loan } => {
                        format!("open loan {} requires a repayment decision", loan.id)
                    }
                }));
            }
        };

        let batch = Self::batch_from_plan(&plan, &snapshot)?;
        let entries = self.store.apply(batch).await?;
        Ok(CommitReceipt {
            entries,
            new_balance: plan.new_balance,
            fee: plan.fee,
        })
    }

    /// Computes the fee a request would incur, without planning legs.
    ///
    /// # Errors
    ///
    /// Returns store errors from the snapshot reads.
    pub async fn fee_preview(&self, request: &TransactionRequest) -> EngineResult<FeeBreakdown> {
        let schedule = self.active_schedule()?;
        let snapshot = self.snapshot(request.account_id, &schedule).await?;
        let ctx = PlanContext {
            snapshot: &snapshot,
            transfer_target: None,
            schedule: &schedule,
            config: &self.config,
            today: Utc::now().date_naive(),
        };
        Ok(Planner::compute_fee(request, &ctx))
    }

    /// Voids a completed entry: flips it to voided and applies the exact
    /// opposite balance adjustment. The entry is never deleted, and a
    /// second void of the same entry fails.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown entry and validation errors for
    /// entries that are not voidable.
    pub async fn void_entry(&self, entry_id: LedgerEntryId) -> EngineResult<VoidReceipt> {
        let entry = self.store.entry(entry_id).await?;
        let _guard = self.lock_accounts(vec![entry.account_id]).await;

        // Re-read under the lock; a concurrent void may have won.
        let entry = self.store.entry(entry_id).await?;
        let plan = plan_void(&entry)?;

        let mut batch = CommitBatch::default();
        batch.entry_updates.push(EntryUpdate {
            entry_id: plan.entry_id,
            status: EntryStatus::Voided,
            audit_note: Some(plan.audit_note),
        });
        batch.balance_deltas.insert(plan.account_id, plan.adjustment);
        self.store.apply(batch).await?;

        let account = self.store.account(plan.account_id).await?;
        tracing::info!(%entry_id, adjustment = %plan.adjustment, "entry voided");
        Ok(VoidReceipt {
            entry_id,
            adjustment: plan.adjustment,
            new_balance: account.balance,
        })
    }

    /// Places (or extends) a hold on a deposited check, adding the given
    /// tags to its tag set.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown check and validation errors for
    /// checks that cannot be held (issued, or already settled).
    pub async fn place_hold(&self, check_id: CheckId, tags: Vec<String>) -> EngineResult<Check> {
        let check = self.store.check(check_id).await?;
        let _guard = self.lock_accounts(vec![check.account_id]).await;

        let check = self.store.check(check_id).await?;
        HoldService::validate_placement(&check)?;

        let mut batch = CommitBatch::default();
        batch.check_updates.push(CheckUpdate {
            check_id,
            cleared_amount: check.cleared_amount,
            status: cashbook_core::hold::CheckStatus::Hold,
            add_tags: tags.into_iter().collect::<BTreeSet<_>>(),
        });
        self.store.apply(batch).await?;

        let held = self.store.check(check_id).await?;
        tracing::info!(%check_id, tags = ?held.tags, "hold placed");
        Ok(held)
    }

    /// Fully releases the given held checks. Idempotent: checks that are
    /// already cleared (or otherwise not releasable) credit nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown check or store errors from the
    /// atomic apply.
    pub async fn release_holds(&self, check_ids: &[CheckId]) -> EngineResult<ReleasePlan> {
        let mut checks = Vec::with_capacity(check_ids.len());
        for &check_id in check_ids {
            checks.push(self.store.check(check_id).await?);
        }
        let accounts: Vec<AccountId> = checks.iter().map(|c| c.account_id).collect();
        let _guards = self.lock_accounts(accounts).await;

        // Re-read under the locks.
        checks.clear();
        for &check_id in check_ids {
            checks.push(self.store.check(check_id).await?);
        }
        let plan = HoldService::release_full(&checks);
        self.apply_release(&plan, &checks).await?;
        Ok(plan)
    }

    /// Releases held funds for a tag, across every account carrying it.
    ///
    /// With a budget this is a partial release: oldest deposits first
    /// until the budget runs out, regardless of which account each check
    /// sits on. Without one, everything outstanding under the tag is
    /// released. All affected accounts are credited in one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns validation errors for a non-positive budget and store
    /// errors from the atomic apply.
    pub async fn release_tagged(
        &self,
        tag: &str,
        budget: Option<Decimal>,
    ) -> EngineResult<ReleasePlan> {
        let tagged = self.store.checks_by_tag(tag).await?;
        let accounts: Vec<AccountId> = tagged.iter().map(|c| c.account_id).collect();
        let _guards = self.lock_accounts(accounts).await;

        // Re-read under the locks.
        let mut checks = Vec::with_capacity(tagged.len());
        for check in &tagged {
            checks.push(self.store.check(check.id).await?);
        }
        let plan = match budget {
            Some(budget) => HoldService::release_partial(tag, budget, &checks)?,
            None => HoldService::release_all_for_tag(tag, &checks),
        };
        self.apply_release(&plan, &checks).await?;
        tracing::info!(
            tag,
            accounts = plan.credited_accounts.len(),
            credited = %plan.total_credited(),
            unallocated = %plan.unallocated_budget,
            "hold release"
        );
        Ok(plan)
    }

    /// Marks a deposited check as returned unpaid.
    ///
    /// The check flips to bounced and any funds a prior release credited
    /// to the balance are debited back, in one atomic batch. Bouncing the
    /// same check twice fails, so the reversal can never apply twice.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown check and validation errors for
    /// checks that cannot bounce (issued, already bounced, or voided).
    pub async fn bounce_check(&self, check_id: CheckId) -> EngineResult<BounceReceipt> {
        let check = self.store.check(check_id).await?;
        let _guard = self.lock_accounts(vec![check.account_id]).await;

        // Re-read under the lock; a concurrent bounce may have won.
        let check = self.store.check(check_id).await?;
        let plan = HoldService::bounce(&check)?;

        let mut batch = CommitBatch::default();
        batch.check_updates.push(CheckUpdate {
            check_id,
            cleared_amount: check.cleared_amount,
            status: cashbook_core::hold::CheckStatus::Bounced,
            add_tags: BTreeSet::new(),
        });
        if plan.reversal > Decimal::ZERO {
            batch.entries.push(NewEntry {
                account_id: plan.account_id,
                kind: LegKind::Debit,
                amount: plan.reversal,
                status: EntryStatus::Completed,
                related_loan: None,
                memo: format!("check bounce #{}", check.check_number),
                audit: serde_json::Value::Null,
            });
            batch.balance_deltas.insert(plan.account_id, -plan.reversal);
        }
        self.store.apply(batch).await?;

        let account = self.store.account(plan.account_id).await?;
        tracing::info!(%check_id, reversal = %plan.reversal, "check bounced");
        Ok(BounceReceipt {
            check_id,
            reversal: plan.reversal,
            new_balance: account.balance,
        })
    }

    /// Reports held checks past the bounce review window. Read-only.
    ///
    /// # Errors
    ///
    /// Returns store errors from the check read.
    pub async fn stale_holds(&self, account_id: AccountId) -> EngineResult<Vec<CheckId>> {
        let checks = self.store.checks_for_account(account_id).await?;
        Ok(HoldService::flag_stale(
            &checks,
            Utc::now().date_naive(),
            &self.config.hold,
        ))
    }

    /// Disburses a new loan: creates the loan and credits the principal
    /// to the account in one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns validation errors for a non-positive principal.
    pub async fn disburse_loan(
        &self,
        account_id: AccountId,
        amount: Decimal,
        due_date: chrono::NaiveDate,
    ) -> EngineResult<Loan> {
        LoanService::validate_principal(amount)?;
        let _guard = self.lock_accounts(vec![account_id]).await;
        self.store.account(account_id).await?;

        let loan = Loan::new(account_id, amount, due_date);
        let mut batch = CommitBatch::default();
        batch.new_loans.push(loan.clone());
        batch.entries.push(NewEntry {
            account_id,
            kind: LegKind::Credit,
            amount,
            status: EntryStatus::Completed,
            related_loan: Some(loan.id),
            memo: "loan disbursement".to_string(),
            audit: serde_json::Value::Null,
        });
        batch.balance_deltas.insert(account_id, amount);
        self.store.apply(batch).await?;

        tracing::info!(%account_id, loan_id = %loan.id, %amount, "loan disbursed");
        Ok(loan)
    }

    /// Repays a loan from the account balance.
    ///
    /// Excess beyond the named loan follows the overpayment decision:
    /// `ApplyToNextLoan` cascades one hop to the account's next open loan
    /// (oldest due date first), `AddToBalance` leaves it where it is.
    /// Anything left after the hop stays on the balance either way.
    ///
    /// # Errors
    ///
    /// Returns validation errors for unknown or closed loans and
    /// `InsufficientFunds` when the balance cannot cover the applied
    /// amounts.
    pub async fn repay_loan(
        &self,
        account_id: AccountId,
        loan_id: LoanId,
        payment: Decimal,
        overpayment: OverpaymentDecision,
    ) -> EngineResult<RepaymentReceipt> {
        let _guard = self.lock_accounts(vec![account_id]).await;

        let account = self.store.account(account_id).await?;
        let loan = self.store.loan(loan_id).await?;
        if loan.account_id != account_id {
            return Err(EngineError::Validation(format!(
                "loan {loan_id} does not belong to account {account_id}"
            )));
        }

        let split = LoanService::apply_repayment(&loan, payment)?;
        let mut applied = vec![(loan.id, split.applied)];
        let mut updates = vec![LoanUpdate {
            loan_id: loan.id,
            amount: split.remaining,
            status: if split.paid_off {
                LoanStatus::Paid
            } else {
                loan.status
            },
        }];

        let mut left_on_balance = split.excess;
        if split.excess > Decimal::ZERO && overpayment == OverpaymentDecision::ApplyToNextLoan {
            let open = self.store.open_loans(account_id).await?;
            if let Some(next) = LoanService::next_open_loan(&open, loan.id) {
                let hop = LoanService::apply_repayment(next, split.excess)?;
                applied.push((next.id, hop.applied));
                updates.push(LoanUpdate {
                    loan_id: next.id,
                    amount: hop.remaining,
                    status: if hop.paid_off {
                        LoanStatus::Paid
                    } else {
                        next.status
                    },
                });
                left_on_balance = hop.excess;
            }
        }

        let total_applied: Decimal = applied.iter().map(|(_, amount)| *amount).sum();
        if account.balance < total_applied {
            return Err(EngineError::InsufficientFunds(
                total_applied - account.balance,
            ));
        }

        let mut batch = CommitBatch {
            loan_updates: updates,
            ..CommitBatch::default()
        };
        for &(id, amount) in &applied {
            if amount > Decimal::ZERO {
                batch.entries.push(NewEntry {
                    account_id,
                    kind: LegKind::Debit,
                    amount,
                    status: EntryStatus::Completed,
                    related_loan: Some(id),
                    memo: "loan repayment".to_string(),
                    audit: serde_json::Value::Null,
                });
            }
        }
        batch.balance_deltas.insert(account_id, -total_applied);
        self.store.apply(batch).await?;

        tracing::info!(
            %account_id,
            %loan_id,
            %payment,
            %total_applied,
            %left_on_balance,
            "loan repayment applied"
        );
        Ok(RepaymentReceipt {
            applied,
            left_on_balance,
            new_balance: account.balance - total_applied,
        })
    }

    fn active_schedule(&self) -> EngineResult<FeeSchedule> {
        self.schedule
            .read()
            .map(|s| s.clone())
            .map_err(|_| EngineError::Internal("schedule lock poisoned".to_string()))
    }

    async fn snapshot(
        &self,
        account_id: AccountId,
        schedule: &FeeSchedule,
    ) -> EngineResult<AccountSnapshot> {
        let account = self.store.account(account_id).await?;
        let open_loans = self.store.open_loans(account_id).await?;
        let trailing_debit_sum = match schedule.cash_debit.waiver {
            WaiverPolicy::Conditional { window_days, .. } => {
                let since = Utc::now() - chrono::Duration::days(i64::from(window_days));
                self.store.trailing_debit_sum(account_id, since).await?
            }
            WaiverPolicy::AlwaysCharge | WaiverPolicy::NeverCharge => Decimal::ZERO,
        };
        Ok(AccountSnapshot {
            account,
            open_loans,
            trailing_debit_sum,
        })
    }

    async fn resolve_transfer_target(
        &self,
        request: &TransactionRequest,
    ) -> EngineResult<Option<cashbook_core::ledger::Account>> {
        match &request.transfer {
            None => Ok(None),
            Some(transfer) => match self.store.account(transfer.to_account).await {
                Ok(account) => Ok(Some(account)),
                // The planner turns a missing recipient into its own error.
                Err(EngineError::NotFound(_)) => Ok(None),
                Err(err) => Err(err),
            },
        }
    }

    /// Takes the locks for the given accounts in ascending id order.
    async fn lock_accounts(&self, mut accounts: Vec<AccountId>) -> Vec<OwnedMutexGuard<()>> {
        accounts.sort_unstable();
        accounts.dedup();
        let mut guards = Vec::with_capacity(accounts.len());
        for account_id in accounts {
            let lock = self
                .locks
                .entry(account_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(lock.lock_owned().await);
        }
        guards
    }

    fn batch_from_plan(
        plan: &TransactionPlan,
        snapshot: &AccountSnapshot,
    ) -> EngineResult<CommitBatch> {
        let mut batch = CommitBatch {
            entries: plan.legs.clone(),
            balance_deltas: plan.balance_deltas.clone(),
            new_checks: plan.new_checks.clone(),
            ..CommitBatch::default()
        };
        for action in &plan.loan_actions {
            match action {
                LoanAction::Create(loan) => batch.new_loans.push(loan.clone()),
                LoanAction::Repay { loan_id, amount } => {
                    let loan = snapshot
                        .open_loans
                        .iter()
                        .find(|l| l.id == *loan_id)
                        .ok_or_else(|| {
                            EngineError::Internal(format!(
                                "planned repayment of unknown loan {loan_id}"
                            ))
                        })?;
                    let split = LoanService::apply_repayment(loan, *amount)?;
                    batch.loan_updates.push(LoanUpdate {
                        loan_id: *loan_id,
                        amount: split.remaining,
                        status: if split.paid_off {
                            LoanStatus::Paid
                        } else {
                            loan.status
                        },
                    });
                }
            }
        }
        Ok(batch)
    }

    async fn apply_release(&self, plan: &ReleasePlan, checks: &[Check]) -> EngineResult<()> {
        if plan.credits.is_empty() {
            return Ok(());
        }
        let numbers: HashMap<CheckId, &str> = checks
            .iter()
            .map(|c| (c.id, c.check_number.as_str()))
            .collect();

        let mut batch = CommitBatch::default();
        for credit in &plan.credits {
            batch.check_updates.push(CheckUpdate {
                check_id: credit.check_id,
                cleared_amount: credit.new_cleared_amount,
                status: credit.new_status,
                add_tags: BTreeSet::new(),
            });
            if credit.amount > Decimal::ZERO {
                let number = numbers.get(&credit.check_id).copied().unwrap_or("?");
                batch.entries.push(NewEntry {
                    account_id: credit.account_id,
                    kind: LegKind::Credit,
                    amount: credit.amount,
                    status: EntryStatus::Completed,
                    related_loan: None,
                    memo: format!("hold release check #{number}"),
                    audit: serde_json::Value::Null,
                });
            }
        }
        batch.balance_deltas = plan.credited_accounts.clone();
        self.store.apply(batch).await?;
        Ok(())
    }
}
