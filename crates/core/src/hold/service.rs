//! Release planning for held check funds.
//!
//! The service is pure: given the current check records it produces a
//! `ReleasePlan` describing which checks get funded, by how much, and what
//! their new state is. The caller persists the plan atomically.
//!
//! Partial release is the one genuine allocation algorithm in the engine:
//! checks carrying the tag are walked oldest-deposit-date first, each one
//! funded with the lesser of the remaining budget and its uncleared
//! remainder, until the budget or the checks run out.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use cashbook_shared::config::HoldPolicy;
use cashbook_shared::types::{AccountId, CheckId};

use super::error::HoldError;
use super::types::{Check, CheckDirection, CheckStatus};

/// One check's share of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckCredit {
    /// The funded check.
    pub check_id: CheckId,
    /// The account receiving the credit.
    pub account_id: AccountId,
    /// Amount credited by this release.
    pub amount: Decimal,
    /// The check's cleared amount after the release.
    pub new_cleared_amount: Decimal,
    /// The check's status after the release.
    pub new_status: CheckStatus,
}

/// Everything a release decides: per-check credits, per-account totals,
/// and any budget left unallocated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReleasePlan {
    /// Credits in allocation order.
    pub credits: Vec<CheckCredit>,
    /// Total credited per account.
    pub credited_accounts: BTreeMap<AccountId, Decimal>,
    /// Budget left over when the checks ran out first.
    pub unallocated_budget: Decimal,
}

impl ReleasePlan {
    fn push(&mut self, credit: CheckCredit) {
        if credit.amount > Decimal::ZERO {
            *self
                .credited_accounts
                .entry(credit.account_id)
                .or_default() += credit.amount;
        }
        self.credits.push(credit);
    }

    /// Total amount this plan credits across all accounts.
    #[must_use]
    pub fn total_credited(&self) -> Decimal {
        self.credited_accounts.values().copied().sum()
    }
}

/// The state changes a bounce commits atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BouncePlan {
    /// The check being marked as returned unpaid.
    pub check_id: CheckId,
    /// The account whose balance is adjusted.
    pub account_id: AccountId,
    /// Previously released funds clawed back from the balance.
    pub reversal: Decimal,
}

/// Stateless hold release planner.
pub struct HoldService;

impl HoldService {
    /// Validates that a hold may be placed on the check.
    ///
    /// # Errors
    ///
    /// Rejects issued checks and checks past the pending/hold states.
    pub fn validate_placement(check: &Check) -> Result<(), HoldError> {
        if check.direction != CheckDirection::Deposited {
            return Err(HoldError::NotADeposit(check.id));
        }
        if !matches!(check.status, CheckStatus::Pending | CheckStatus::Hold) {
            return Err(HoldError::NotHoldable(check.id));
        }
        Ok(())
    }

    /// Fully releases the given checks.
    ///
    /// Idempotent: a check that is already cleared (or otherwise not
    /// releasable) contributes nothing, so a retry never double-credits.
    #[must_use]
    pub fn release_full(checks: &[Check]) -> ReleasePlan {
        let mut plan = ReleasePlan::default();
        for check in checks {
            if !check.is_releasable() {
                continue;
            }
            plan.push(CheckCredit {
                check_id: check.id,
                account_id: check.account_id,
                amount: check.remaining(),
                new_cleared_amount: check.amount,
                new_status: CheckStatus::Cleared,
            });
        }
        plan
    }

    /// Releases up to `budget` against the checks carrying `tag`,
    /// oldest deposit date first (ties break on id).
    ///
    /// A check fully funded by this pass flips to `Cleared`; a partially
    /// funded one keeps its current status with the new cleared amount.
    /// Stops when the budget is exhausted or no tagged check remains.
    ///
    /// # Errors
    ///
    /// Returns `HoldError::NonPositiveAmount` if `budget <= 0`.
    pub fn release_partial(
        tag: &str,
        budget: Decimal,
        checks: &[Check],
    ) -> Result<ReleasePlan, HoldError> {
        if budget <= Decimal::ZERO {
            return Err(HoldError::NonPositiveAmount(budget));
        }

        let mut eligible: Vec<&Check> = checks
            .iter()
            .filter(|c| c.has_tag(tag) && c.is_releasable())
            .collect();
        eligible.sort_by_key(|c| (c.deposit_date, c.id));

        let mut plan = ReleasePlan::default();
        let mut left = budget;

        for check in eligible {
            if left <= Decimal::ZERO {
                break;
            }
            let credit = left.min(check.remaining());
            let new_cleared = check.cleared_amount + credit;
            let new_status = if new_cleared == check.amount {
                CheckStatus::Cleared
            } else {
                check.status
            };
            plan.push(CheckCredit {
                check_id: check.id,
                account_id: check.account_id,
                amount: credit,
                new_cleared_amount: new_cleared,
                new_status,
            });
            left -= credit;
        }

        plan.unallocated_budget = left;
        Ok(plan)
    }

    /// Releases everything outstanding for a tag: a partial release with
    /// the budget set to the total remaining.
    #[must_use]
    pub fn release_all_for_tag(tag: &str, checks: &[Check]) -> ReleasePlan {
        let total: Decimal = checks
            .iter()
            .filter(|c| c.has_tag(tag) && c.is_releasable())
            .map(Check::remaining)
            .sum();
        if total <= Decimal::ZERO {
            return ReleasePlan::default();
        }
        // Budget equals the outstanding total, so the partial walk funds
        // every eligible check and cannot fail.
        Self::release_partial(tag, total, checks).unwrap_or_default()
    }

    /// Plans the bounce of a deposited check: the check flips to
    /// `Bounced` and any funds a prior release credited are reversed.
    ///
    /// A bounced or voided check is rejected, so the reversal can never
    /// apply twice.
    ///
    /// # Errors
    ///
    /// Returns `NotADeposit` for issued checks and `NotBounceable` for
    /// checks already bounced or voided.
    pub fn bounce(check: &Check) -> Result<BouncePlan, HoldError> {
        if check.direction != CheckDirection::Deposited {
            return Err(HoldError::NotADeposit(check.id));
        }
        if !matches!(
            check.status,
            CheckStatus::Pending | CheckStatus::Hold | CheckStatus::Cleared
        ) {
            return Err(HoldError::NotBounceable(check.id));
        }
        Ok(BouncePlan {
            check_id: check.id,
            account_id: check.account_id,
            reversal: check.cleared_amount,
        })
    }

    /// Reports held checks that have sat unresolved past the bounce
    /// review window. Reporting only; the caller decides what to do.
    #[must_use]
    pub fn flag_stale(checks: &[Check], today: NaiveDate, policy: &HoldPolicy) -> Vec<CheckId> {
        let cutoff_days = i64::from(policy.bounce_threshold_days) + i64::from(policy.period_days);
        checks
            .iter()
            .filter(|c| c.is_releasable())
            .filter(|c| (today - c.deposit_date).num_days() > cutoff_days)
            .map(|c| c.id)
            .collect()
    }
}
