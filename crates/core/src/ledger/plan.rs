//! Transaction planning.
//!
//! Planning is the read-only half of the two-phase submit: it turns a
//! request plus the account snapshot into either an explicit
//! `TransactionPlan` (every leg, balance delta, check record, and loan
//! action the commit will persist) or the decision the caller still owes.
//! Nothing here mutates state, so an abandoned proposal costs nothing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use cashbook_shared::EngineConfig;
use cashbook_shared::types::AccountId;

use crate::fees::{FeeBreakdown, FeeCalculator, FeeContext, FeeSchedule};
use crate::hold::{Check, CheckDirection, CheckStatus};
use crate::loan::{Loan, LoanService};

use super::error::LedgerError;
use super::types::{
    Account, AccountSnapshot, Decisions, EntryStatus, LegKind, LoanAction, NewEntry,
    PendingDecision, RepaymentDecision, ShortfallDecision, TransactionRequest,
};
use super::validation::validate_request;

/// Everything a plan decides; the engine persists it as one atomic batch.
#[derive(Debug, Clone)]
pub struct TransactionPlan {
    /// Planned legs, ids and timestamps assigned at commit.
    pub legs: Vec<NewEntry>,
    /// Check records to create (`checks_in` / `checks_out`).
    pub new_checks: Vec<Check>,
    /// Loans to create or repay.
    pub loan_actions: Vec<LoanAction>,
    /// Net balance change per account.
    pub balance_deltas: BTreeMap<AccountId, Decimal>,
    /// The fee computation, kept for the audit trail even when not charged.
    pub fee: FeeBreakdown,
    /// The source account's balance after commit.
    pub new_balance: Decimal,
}

/// Result of a planning pass.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    /// No decision outstanding; the plan can commit.
    Ready(Box<TransactionPlan>),
    /// The caller must decide before the transaction can commit.
    NeedsDecision(PendingDecision),
}

/// Inputs the engine resolves before planning.
#[derive(Debug, Clone)]
pub struct PlanContext<'a> {
    /// Snapshot of the source account.
    pub snapshot: &'a AccountSnapshot,
    /// The transfer recipient, when the request has a transfer leg.
    pub transfer_target: Option<&'a Account>,
    /// The active fee schedule.
    pub schedule: &'a FeeSchedule,
    /// Engine configuration.
    pub config: &'a EngineConfig,
    /// Business date for check records and loan due-date defaults.
    pub today: NaiveDate,
}

/// Stateless transaction planner.
pub struct Planner;

impl Planner {
    /// Plans a transaction.
    ///
    /// Decision points are evaluated in order: the shortfall check first
    /// (on the request as submitted, with any covering loan folded in),
    /// then the repayment offer. Routing credit to a loan repayment can
    /// itself reopen a shortfall; that case is an error rather than a
    /// second decision round, and the caller re-proposes with different
    /// decisions.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` for validation failures, an under-sized
    /// covering loan, or a repayment decision naming a loan that is not
    /// open on this account.
    pub fn plan(
        request: &TransactionRequest,
        ctx: &PlanContext<'_>,
        decisions: &Decisions,
    ) -> Result<PlanOutcome, LedgerError> {
        validate_request(request, ctx.config)?;

        if let Some(transfer) = &request.transfer
            && ctx.transfer_target.is_none()
        {
            return Err(LedgerError::TransferTargetNotFound(transfer.to_account));
        }

        let fee = Self::compute_fee(request, ctx);
        let fee_charged = if request.apply_fee {
            fee.total
        } else {
            Decimal::ZERO
        };

        let balance = ctx.snapshot.account.balance;
        let available_credit = request.available_credit();
        let total_debit = request.total_debit();

        // Shortfall check, covering loan folded in.
        let covering_loan = match &decisions.shortfall {
            Some(ShortfallDecision::CoverWithLoan { amount, due_date }) => {
                if *amount <= Decimal::ZERO {
                    return Err(LedgerError::NonPositiveAmount(*amount));
                }
                Some(Loan::new(request.account_id, *amount, *due_date))
            }
            None => None,
        };
        let loan_credit = covering_loan
            .as_ref()
            .map_or(Decimal::ZERO, |l| l.amount);

        let prospective = balance + available_credit + loan_credit - total_debit - fee_charged;
        if prospective < Decimal::ZERO {
            let shortfall = -prospective;
            if covering_loan.is_some() {
                return Err(LedgerError::ShortfallNotCovered(shortfall));
            }
            return Ok(PlanOutcome::NeedsDecision(PendingDecision::Shortfall {
                amount: shortfall,
            }));
        }

        // Repayment offer when credit arrives while loans are open.
        let has_open_loan = ctx.snapshot.open_loans.iter().any(|l| l.status.is_open());
        let repayment = if available_credit > Decimal::ZERO && has_open_loan {
            match decisions.repayment {
                None => {
                    let oldest = ctx
                        .snapshot
                        .open_loans
                        .iter()
                        .filter(|l| l.status.is_open())
                        .min_by_key(|l| (l.due_date, l.id))
                        .cloned();
                    if let Some(loan) = oldest {
                        return Ok(PlanOutcome::NeedsDecision(
                            PendingDecision::RepaymentOffer { loan },
                        ));
                    }
                    None
                }
                Some(RepaymentDecision::ToBalance) => None,
                Some(RepaymentDecision::RepayLoan(loan_id)) => {
                    let loan = ctx
                        .snapshot
                        .open_loans
                        .iter()
                        .find(|l| l.id == loan_id && l.status.is_open())
                        .ok_or(LedgerError::LoanNotOpen(loan_id))?;
                    let split = LoanService::apply_repayment(loan, available_credit)
                        .map_err(|_| LedgerError::LoanNotOpen(loan_id))?;
                    // The applied portion leaves the balance; re-check the projection.
                    if prospective - split.applied < Decimal::ZERO {
                        return Err(LedgerError::ShortfallNotCovered(
                            split.applied - prospective,
                        ));
                    }
                    Some((loan_id, split.applied))
                }
            }
        } else {
            None
        };

        Ok(PlanOutcome::Ready(Box::new(Self::build_plan(
            request,
            ctx,
            fee,
            fee_charged,
            covering_loan,
            repayment,
        ))))
    }

    /// Computes the fee for a request without planning legs. The engine
    /// uses this for fee previews; `plan` calls it internally.
    #[must_use]
    pub fn compute_fee(request: &TransactionRequest, ctx: &PlanContext<'_>) -> FeeBreakdown {
        let fee_ctx = FeeContext {
            cash_debit_total: request.cash_debit_total(),
            check_debit_count: u32::try_from(request.debit_checks.len()).unwrap_or(u32::MAX),
            missing_account_count: u32::try_from(
                request
                    .credit_checks
                    .iter()
                    .filter(|c| c.counterparty_account.is_none())
                    .count(),
            )
            .unwrap_or(u32::MAX),
            is_reprint: request.debit_checks.iter().any(|c| c.reprint),
            is_rush: request.is_rush,
            trailing_debit_sum: ctx.snapshot.trailing_debit_sum,
        };
        FeeCalculator::compute(ctx.schedule, &fee_ctx)
    }

    #[allow(clippy::too_many_lines)]
    fn build_plan(
        request: &TransactionRequest,
        ctx: &PlanContext<'_>,
        fee: FeeBreakdown,
        fee_charged: Decimal,
        covering_loan: Option<Loan>,
        repayment: Option<(cashbook_shared::types::LoanId, Decimal)>,
    ) -> TransactionPlan {
        let source = request.account_id;
        let mut legs = Vec::new();
        let mut new_checks = Vec::new();
        let mut loan_actions = Vec::new();
        let mut deltas: BTreeMap<AccountId, Decimal> = BTreeMap::new();

        let mut leg = |account_id, kind, amount, related_loan, memo: String, audit| {
            legs.push(NewEntry {
                account_id,
                kind,
                amount,
                status: EntryStatus::Completed,
                related_loan,
                memo,
                audit,
            });
        };

        if request.credit_cash > Decimal::ZERO {
            leg(
                source,
                LegKind::Credit,
                request.credit_cash,
                None,
                "cash deposit".to_string(),
                serde_json::Value::Null,
            );
            *deltas.entry(source).or_default() += request.credit_cash;
        }

        for deposit in &request.credit_checks {
            let (status, cleared) = if deposit.on_hold {
                (CheckStatus::Hold, Decimal::ZERO)
            } else {
                (CheckStatus::Cleared, deposit.amount)
            };
            new_checks.push(Check {
                id: cashbook_shared::types::CheckId::new(),
                account_id: source,
                direction: CheckDirection::Deposited,
                amount: deposit.amount,
                cleared_amount: cleared,
                check_number: deposit.check_number.clone(),
                counterparty_account: deposit.counterparty_account.clone(),
                tags: deposit.hold_tags.iter().cloned().collect(),
                deposit_date: ctx.today,
                status,
            });
            if deposit.on_hold {
                // Held funds do not credit the balance now; the release
                // flow writes the credit leg later.
                continue;
            }
            leg(
                source,
                LegKind::Credit,
                deposit.amount,
                None,
                format!("check deposit #{}", deposit.check_number),
                serde_json::Value::Null,
            );
            *deltas.entry(source).or_default() += deposit.amount;
        }

        for &amount in &request.debit_cash {
            leg(
                source,
                LegKind::Debit,
                amount,
                None,
                "cash withdrawal".to_string(),
                serde_json::Value::Null,
            );
            *deltas.entry(source).or_default() -= amount;
        }

        for withdrawal in &request.debit_checks {
            new_checks.push(Check {
                id: cashbook_shared::types::CheckId::new(),
                account_id: source,
                direction: CheckDirection::Issued,
                amount: withdrawal.amount,
                cleared_amount: Decimal::ZERO,
                check_number: withdrawal.check_number.clone(),
                counterparty_account: None,
                tags: std::collections::BTreeSet::new(),
                deposit_date: ctx.today,
                status: CheckStatus::Pending,
            });
            leg(
                source,
                LegKind::Debit,
                withdrawal.amount,
                None,
                format!("check withdrawal #{}", withdrawal.check_number),
                serde_json::Value::Null,
            );
            *deltas.entry(source).or_default() -= withdrawal.amount;
        }

        if let Some(loan) = covering_loan {
            leg(
                source,
                LegKind::Credit,
                loan.amount,
                Some(loan.id),
                "loan disbursement (shortfall cover)".to_string(),
                serde_json::Value::Null,
            );
            *deltas.entry(source).or_default() += loan.amount;
            loan_actions.push(LoanAction::Create(loan));
        }

        if let Some((loan_id, applied)) = repayment
            && applied > Decimal::ZERO
        {
            leg(
                source,
                LegKind::Debit,
                applied,
                Some(loan_id),
                "loan repayment".to_string(),
                serde_json::Value::Null,
            );
            *deltas.entry(source).or_default() -= applied;
            loan_actions.push(LoanAction::Repay { loan_id, amount: applied });
        }

        if let (Some(transfer), Some(target)) = (&request.transfer, ctx.transfer_target) {
            leg(
                source,
                LegKind::TransferOut,
                transfer.amount,
                None,
                format!("transfer to {}", target.number),
                serde_json::Value::Null,
            );
            leg(
                target.id,
                LegKind::TransferIn,
                transfer.amount,
                None,
                format!("transfer from {}", ctx.snapshot.account.number),
                serde_json::Value::Null,
            );
            *deltas.entry(source).or_default() -= transfer.amount;
            *deltas.entry(target.id).or_default() += transfer.amount;
        }

        if fee_charged > Decimal::ZERO {
            leg(
                source,
                LegKind::Fee,
                fee_charged,
                None,
                fee.memo.clone(),
                serde_json::to_value(&fee).unwrap_or(serde_json::Value::Null),
            );
            *deltas.entry(source).or_default() -= fee_charged;
        }

        let new_balance = ctx.snapshot.account.balance
            + deltas.get(&source).copied().unwrap_or_default();

        TransactionPlan {
            legs,
            new_checks,
            loan_actions,
            balance_deltas: deltas,
            fee,
            new_balance,
        }
    }
}
