//! Fee schedule data model.
//!
//! The schedule is pure configuration: a tree of rule groups, each with an
//! `enabled` flag, loaded from the configuration source and validated
//! before the engine accepts it. It has no behavior beyond being queried
//! by the calculator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashbook_shared::types::round_money;

use super::error::ScheduleError;

/// How a fee amount is derived from the value it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "rate")]
pub enum FeeBasis {
    /// Fixed dollar amount.
    Flat(Decimal),
    /// Percentage of the dollar amount the rule matched on.
    Percent(Decimal),
    /// Fixed dollar amount per matched item (e.g. per check).
    PerItem(Decimal),
}

impl FeeBasis {
    /// Applies the basis to a matched value, rounded to cents.
    ///
    /// For `Percent` and `PerItem`, `value` is the dollar amount or item
    /// count the enclosing rule matched on.
    #[must_use]
    pub fn apply(&self, value: Decimal) -> Decimal {
        match self {
            Self::Flat(fee) => round_money(*fee),
            Self::Percent(rate) => round_money(value * *rate / Decimal::ONE_HUNDRED),
            Self::PerItem(fee) => round_money(*fee * value),
        }
    }

    fn validate(&self) -> Result<(), ScheduleError> {
        match self {
            Self::Flat(fee) | Self::PerItem(fee) => {
                if fee.is_sign_negative() {
                    return Err(ScheduleError::NegativeFee(*fee));
                }
            }
            Self::Percent(rate) => {
                if rate.is_sign_negative() || *rate > Decimal::ONE_HUNDRED {
                    return Err(ScheduleError::InvalidPercent(*rate));
                }
            }
        }
        Ok(())
    }
}

/// When a cash-debit fee is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum WaiverPolicy {
    /// Fee always applies.
    AlwaysCharge,
    /// Fee never applies.
    NeverCharge,
    /// Fee is waived when the account's total debit activity over the
    /// trailing window (voided entries excluded) is below the threshold.
    Conditional {
        /// Activity threshold in dollars.
        threshold: Decimal,
        /// Trailing window length in days.
        window_days: u32,
    },
}

/// One inclusive `{from, to, fee}` range in a tiered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Inclusive lower bound (count or dollar amount).
    pub from: Decimal,
    /// Inclusive upper bound.
    pub to: Decimal,
    /// Fee charged when the matched value falls in this range.
    pub fee: FeeBasis,
}

/// A rule whose fee is looked up from an ordered list of tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieredRule {
    /// Whether this rule group participates in fee computation.
    pub enabled: bool,
    /// Ordered, non-overlapping, gap-free tiers.
    pub tiers: Vec<Tier>,
}

impl TieredRule {
    /// Returns the tier containing `value`, if any.
    ///
    /// A lookup outside every tier is a policy-level zero fee, so `None`
    /// here is not an error.
    #[must_use]
    pub fn lookup(&self, value: Decimal) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.from <= value && value <= t.to)
    }

    /// `step` is the smallest representable increment of the matched
    /// value: one for count tiers, one cent for dollar-amount tiers.
    /// Consecutive tiers must sit exactly that close, or values between
    /// them would silently match nothing.
    fn validate(&self, step: Decimal) -> Result<(), ScheduleError> {
        for tier in &self.tiers {
            if tier.from > tier.to {
                return Err(ScheduleError::InvertedTier {
                    from: tier.from,
                    to: tier.to,
                });
            }
            tier.fee.validate()?;
        }
        for pair in self.tiers.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.from <= prev.to {
                return Err(ScheduleError::OverlappingTiers { at: next.from });
            }
            if next.from - prev.to > step {
                return Err(ScheduleError::GappedTiers {
                    previous_to: prev.to,
                    next_from: next.from,
                });
            }
        }
        Ok(())
    }
}

/// Cash-debit fee rule: flat or percentage, with a waiver policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashDebitRule {
    /// Whether this rule group participates in fee computation.
    pub enabled: bool,
    /// Flat amount or percentage of the cash debit total.
    pub basis: FeeBasis,
    /// Waiver condition.
    pub waiver: WaiverPolicy,
}

/// Flat fee for reprinting a check document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReprintRule {
    /// Whether this rule group participates in fee computation.
    pub enabled: bool,
    /// Flat reprint fee.
    pub fee: Decimal,
}

/// Expedited-processing fee rule.
///
/// Rush fees have their own tiers: by dollar amount for cash debits and by
/// check count for check debits. When `overwrite` is true a matched rush
/// fee replaces the corresponding standard component instead of stacking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RushRule {
    /// Whether this rule group participates in fee computation.
    pub enabled: bool,
    /// Replace the corresponding non-rush component rather than add to it.
    pub overwrite: bool,
    /// Tiers matched against the cash debit total (dollars).
    pub cash_tiers: TieredRule,
    /// Tiers matched against the check debit count.
    pub check_tiers: TieredRule,
}

/// The complete fee schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Master switch; when false every fee is zero.
    pub enabled: bool,
    /// Cash-debit rule.
    pub cash_debit: CashDebitRule,
    /// Check-debit rule, tiered by check count.
    pub check_debit: TieredRule,
    /// Rule for deposited checks missing a counterparty account, tiered by count.
    pub missing_account_credit: TieredRule,
    /// Check reprint rule.
    pub check_reprint: ReprintRule,
    /// Rush rule.
    pub rush: RushRule,
}

impl FeeSchedule {
    /// Validates the schedule at load time.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError` for inverted, overlapping, or gapped tiers,
    /// negative fees, out-of-range percentages, or a zero waiver window.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        self.cash_debit.basis.validate()?;
        if let WaiverPolicy::Conditional { window_days, .. } = self.cash_debit.waiver
            && window_days == 0
        {
            return Err(ScheduleError::ZeroWaiverWindow);
        }
        self.check_debit.validate(Decimal::ONE)?;
        self.missing_account_credit.validate(Decimal::ONE)?;
        if self.check_reprint.fee.is_sign_negative() {
            return Err(ScheduleError::NegativeFee(self.check_reprint.fee));
        }
        // Cash tiers match dollar amounts, so contiguity is checked at
        // cent granularity; the rest tier over whole check counts.
        self.rush.cash_tiers.validate(Decimal::new(1, 2))?;
        self.rush.check_tiers.validate(Decimal::ONE)?;
        Ok(())
    }

    /// A schedule with everything disabled, useful as a neutral default.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            cash_debit: CashDebitRule {
                enabled: false,
                basis: FeeBasis::Flat(Decimal::ZERO),
                waiver: WaiverPolicy::AlwaysCharge,
            },
            check_debit: TieredRule {
                enabled: false,
                tiers: vec![],
            },
            missing_account_credit: TieredRule {
                enabled: false,
                tiers: vec![],
            },
            check_reprint: ReprintRule {
                enabled: false,
                fee: Decimal::ZERO,
            },
            rush: RushRule {
                enabled: false,
                overwrite: false,
                cash_tiers: TieredRule {
                    enabled: false,
                    tiers: vec![],
                },
                check_tiers: TieredRule {
                    enabled: false,
                    tiers: vec![],
                },
            },
        }
    }
}
