//! Pure fee computation over a validated schedule.
//!
//! `FeeCalculator::compute` is a pure function: the same schedule and
//! context always produce the identical breakdown and memo, which is what
//! makes fee decisions reproducible for auditing. Persisting a fee leg is
//! the caller's job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashbook_shared::types::round_money;

use super::schedule::{FeeSchedule, TieredRule, WaiverPolicy};

/// Everything the calculator needs to know about a proposed transaction
/// and the account's recent activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeContext {
    /// Sum of the requested cash debit legs.
    pub cash_debit_total: Decimal,
    /// Number of check debit legs.
    pub check_debit_count: u32,
    /// Number of deposited checks missing a counterparty account.
    pub missing_account_count: u32,
    /// Whether the request includes a check reprint.
    pub is_reprint: bool,
    /// Whether expedited processing was requested.
    pub is_rush: bool,
    /// The account's debit activity over the waiver window, voided
    /// entries excluded. Computed by the caller.
    pub trailing_debit_sum: Decimal,
}

/// Which rule group produced a fee component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeRuleKind {
    /// Cash-debit rule.
    CashDebit,
    /// Check-debit tier rule.
    CheckDebit,
    /// Missing-counterparty deposit tier rule.
    MissingAccountCredit,
    /// Check reprint flat rule.
    CheckReprint,
    /// Rush tier matched on the cash debit total.
    RushCash,
    /// Rush tier matched on the check debit count.
    RushCheck,
}

impl FeeRuleKind {
    fn label(self) -> &'static str {
        match self {
            Self::CashDebit => "cash debit",
            Self::CheckDebit => "check debit",
            Self::MissingAccountCredit => "missing-account credit",
            Self::CheckReprint => "check reprint",
            Self::RushCash => "rush (cash)",
            Self::RushCheck => "rush (checks)",
        }
    }
}

/// One rule group's contribution to the fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeComponent {
    /// The rule that fired.
    pub rule: FeeRuleKind,
    /// The amount the rule computed (recorded even when suppressed).
    pub amount: Decimal,
    /// Suppressed by a waiver condition.
    pub waived: bool,
    /// Suppressed because a rush tier replaced this component.
    pub replaced_by_rush: bool,
}

impl FeeComponent {
    fn charged(rule: FeeRuleKind, amount: Decimal) -> Self {
        Self {
            rule,
            amount,
            waived: false,
            replaced_by_rush: false,
        }
    }

    /// Whether this component counts toward the total.
    #[must_use]
    pub fn survives(&self) -> bool {
        !self.waived && !self.replaced_by_rush
    }
}

/// Result of fee computation: the total, the per-rule components, and a
/// human-readable audit memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Total fee, rounded to cents (half-even).
    pub total: Decimal,
    /// Per-rule components in deterministic order.
    pub components: Vec<FeeComponent>,
    /// Audit memo enumerating which rules fired.
    pub memo: String,
}

impl FeeBreakdown {
    /// A zero fee with an explanatory memo.
    #[must_use]
    pub fn zero(memo: impl Into<String>) -> Self {
        Self {
            total: Decimal::ZERO,
            components: vec![],
            memo: memo.into(),
        }
    }
}

/// Stateless fee calculator.
pub struct FeeCalculator;

impl FeeCalculator {
    /// Evaluates the schedule against a transaction context.
    ///
    /// Rule groups are evaluated independently and additively; the rush
    /// rule may replace the cash-debit and check-debit components when its
    /// `overwrite` flag is set. An unmatched tier lookup contributes zero
    /// and logs a warning (explicit policy, not an error).
    #[must_use]
    pub fn compute(schedule: &FeeSchedule, ctx: &FeeContext) -> FeeBreakdown {
        if !schedule.enabled {
            return FeeBreakdown::zero("fee schedule disabled");
        }

        let mut components = Vec::new();

        if schedule.cash_debit.enabled && ctx.cash_debit_total > Decimal::ZERO {
            let amount = schedule.cash_debit.basis.apply(ctx.cash_debit_total);
            let waived = match schedule.cash_debit.waiver {
                WaiverPolicy::AlwaysCharge => false,
                WaiverPolicy::NeverCharge => true,
                WaiverPolicy::Conditional { threshold, .. } => ctx.trailing_debit_sum < threshold,
            };
            components.push(FeeComponent {
                rule: FeeRuleKind::CashDebit,
                amount,
                waived,
                replaced_by_rush: false,
            });
        }

        if schedule.check_debit.enabled && ctx.check_debit_count > 0 {
            if let Some(amount) = Self::tier_fee(
                &schedule.check_debit,
                Decimal::from(ctx.check_debit_count),
                FeeRuleKind::CheckDebit,
            ) {
                components.push(FeeComponent::charged(FeeRuleKind::CheckDebit, amount));
            }
        }

        if schedule.missing_account_credit.enabled && ctx.missing_account_count > 0 {
            if let Some(amount) = Self::tier_fee(
                &schedule.missing_account_credit,
                Decimal::from(ctx.missing_account_count),
                FeeRuleKind::MissingAccountCredit,
            ) {
                components.push(FeeComponent::charged(
                    FeeRuleKind::MissingAccountCredit,
                    amount,
                ));
            }
        }

        if schedule.check_reprint.enabled && ctx.is_reprint {
            components.push(FeeComponent::charged(
                FeeRuleKind::CheckReprint,
                round_money(schedule.check_reprint.fee),
            ));
        }

        if schedule.rush.enabled && ctx.is_rush {
            Self::apply_rush(schedule, ctx, &mut components);
        }

        let total = round_money(
            components
                .iter()
                .filter(|c| c.survives())
                .map(|c| c.amount)
                .sum(),
        );
        let memo = Self::memo(&components, total);

        FeeBreakdown {
            total,
            components,
            memo,
        }
    }

    /// Rush tiers fire on the same values as their standard counterparts;
    /// with `overwrite` set they replace that counterpart in the total.
    fn apply_rush(schedule: &FeeSchedule, ctx: &FeeContext, components: &mut Vec<FeeComponent>) {
        let mut rush_fired = Vec::new();

        if schedule.rush.cash_tiers.enabled && ctx.cash_debit_total > Decimal::ZERO {
            if let Some(amount) = Self::tier_fee(
                &schedule.rush.cash_tiers,
                ctx.cash_debit_total,
                FeeRuleKind::RushCash,
            ) {
                rush_fired.push((FeeRuleKind::RushCash, FeeRuleKind::CashDebit, amount));
            }
        }
        if schedule.rush.check_tiers.enabled && ctx.check_debit_count > 0 {
            if let Some(amount) = Self::tier_fee(
                &schedule.rush.check_tiers,
                Decimal::from(ctx.check_debit_count),
                FeeRuleKind::RushCheck,
            ) {
                rush_fired.push((FeeRuleKind::RushCheck, FeeRuleKind::CheckDebit, amount));
            }
        }

        for (rush_rule, standard_rule, amount) in rush_fired {
            if schedule.rush.overwrite {
                for component in components.iter_mut() {
                    if component.rule == standard_rule {
                        component.replaced_by_rush = true;
                    }
                }
            }
            components.push(FeeComponent::charged(rush_rule, amount));
        }
    }

    /// Tier lookup with the degrade-to-zero policy for unmatched values.
    fn tier_fee(rule: &TieredRule, value: Decimal, kind: FeeRuleKind) -> Option<Decimal> {
        match rule.lookup(value) {
            Some(tier) => Some(tier.fee.apply(value)),
            None => {
                tracing::warn!(
                    rule = kind.label(),
                    %value,
                    "no fee tier matched; charging zero"
                );
                None
            }
        }
    }

    fn memo(components: &[FeeComponent], total: Decimal) -> String {
        if components.is_empty() {
            return "no fee rules fired".to_string();
        }
        let mut lines: Vec<String> = components
            .iter()
            .map(|c| {
                if c.waived {
                    format!("{} fee {} (waived)", c.rule.label(), c.amount)
                } else if c.replaced_by_rush {
                    format!("{} fee {} (replaced by rush)", c.rule.label(), c.amount)
                } else {
                    format!("{} fee {}", c.rule.label(), c.amount)
                }
            })
            .collect();
        lines.push(format!("total {total}"));
        lines.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::schedule::{CashDebitRule, FeeBasis, ReprintRule, RushRule, Tier};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn flat_tier(from: Decimal, to: Decimal, fee: Decimal) -> Tier {
        Tier {
            from,
            to,
            fee: FeeBasis::Flat(fee),
        }
    }

    fn test_schedule() -> FeeSchedule {
        FeeSchedule {
            enabled: true,
            cash_debit: CashDebitRule {
                enabled: true,
                basis: FeeBasis::Percent(dec!(1)),
                waiver: WaiverPolicy::AlwaysCharge,
            },
            check_debit: TieredRule {
                enabled: true,
                tiers: vec![
                    flat_tier(dec!(1), dec!(5), dec!(10)),
                    flat_tier(dec!(6), dec!(10), dec!(20)),
                ],
            },
            missing_account_credit: TieredRule {
                enabled: true,
                tiers: vec![flat_tier(dec!(1), dec!(10), dec!(1.50))],
            },
            check_reprint: ReprintRule {
                enabled: true,
                fee: dec!(2.50),
            },
            rush: RushRule {
                enabled: true,
                overwrite: false,
                cash_tiers: TieredRule {
                    enabled: true,
                    tiers: vec![flat_tier(dec!(0), dec!(25000), dec!(7.50))],
                },
                check_tiers: TieredRule {
                    enabled: true,
                    tiers: vec![flat_tier(dec!(1), dec!(10), dec!(5))],
                },
            },
        }
    }

    fn ctx() -> FeeContext {
        FeeContext {
            cash_debit_total: Decimal::ZERO,
            check_debit_count: 0,
            missing_account_count: 0,
            is_reprint: false,
            is_rush: false,
            trailing_debit_sum: Decimal::ZERO,
        }
    }

    #[test]
    fn test_disabled_schedule_charges_nothing() {
        let mut schedule = test_schedule();
        schedule.enabled = false;
        let context = FeeContext {
            cash_debit_total: dec!(1000),
            check_debit_count: 3,
            ..ctx()
        };
        let breakdown = FeeCalculator::compute(&schedule, &context);
        assert_eq!(breakdown.total, Decimal::ZERO);
        assert!(breakdown.components.is_empty());
    }

    #[rstest]
    #[case(5, dec!(10))] // upper bound of first tier
    #[case(6, dec!(20))] // lower bound of second tier
    #[case(0, dec!(0))] // no activity
    #[case(11, dec!(0))] // past every tier: degrade to zero
    fn test_check_debit_tier_boundaries(#[case] count: u32, #[case] expected: Decimal) {
        let schedule = test_schedule();
        let context = FeeContext {
            check_debit_count: count,
            ..ctx()
        };
        let breakdown = FeeCalculator::compute(&schedule, &context);
        assert_eq!(breakdown.total, expected);
    }

    #[rstest]
    #[case(dec!(80), dec!(0))] // below threshold: waived
    #[case(dec!(150), dec!(2.00))] // above threshold: 1% of 200
    fn test_conditional_waiver(#[case] trailing: Decimal, #[case] expected: Decimal) {
        let mut schedule = test_schedule();
        schedule.cash_debit.waiver = WaiverPolicy::Conditional {
            threshold: dec!(100),
            window_days: 30,
        };
        let context = FeeContext {
            cash_debit_total: dec!(200),
            trailing_debit_sum: trailing,
            ..ctx()
        };
        let breakdown = FeeCalculator::compute(&schedule, &context);
        assert_eq!(breakdown.total, expected);
    }

    #[test]
    fn test_waived_component_still_recorded_for_audit() {
        let mut schedule = test_schedule();
        schedule.cash_debit.waiver = WaiverPolicy::NeverCharge;
        let context = FeeContext {
            cash_debit_total: dec!(200),
            ..ctx()
        };
        let breakdown = FeeCalculator::compute(&schedule, &context);
        assert_eq!(breakdown.total, Decimal::ZERO);
        assert_eq!(breakdown.components.len(), 1);
        assert!(breakdown.components[0].waived);
        assert_eq!(breakdown.components[0].amount, dec!(2.00));
        assert!(breakdown.memo.contains("waived"));
    }

    #[test]
    fn test_components_stack_additively() {
        let schedule = test_schedule();
        let context = FeeContext {
            cash_debit_total: dec!(100), // 1% = 1.00
            check_debit_count: 2,        // tier 1 = 10.00
            missing_account_count: 1,    // 1.50
            is_reprint: true,            // 2.50
            ..ctx()
        };
        let breakdown = FeeCalculator::compute(&schedule, &context);
        assert_eq!(breakdown.total, dec!(15.00));
        assert_eq!(breakdown.components.len(), 4);
    }

    #[test]
    fn test_rush_stacks_when_overwrite_false() {
        let schedule = test_schedule();
        let context = FeeContext {
            cash_debit_total: dec!(100), // 1.00 standard + 7.50 rush cash
            is_rush: true,
            ..ctx()
        };
        let breakdown = FeeCalculator::compute(&schedule, &context);
        assert_eq!(breakdown.total, dec!(8.50));
    }

    #[test]
    fn test_rush_replaces_when_overwrite_true() {
        let mut schedule = test_schedule();
        schedule.rush.overwrite = true;
        let context = FeeContext {
            cash_debit_total: dec!(100), // standard 1.00 replaced by rush 7.50
            check_debit_count: 2,        // standard 10.00 replaced by rush 5.00
            is_rush: true,
            ..ctx()
        };
        let breakdown = FeeCalculator::compute(&schedule, &context);
        assert_eq!(breakdown.total, dec!(12.50));

        let cash = breakdown
            .components
            .iter()
            .find(|c| c.rule == FeeRuleKind::CashDebit)
            .unwrap();
        assert!(cash.replaced_by_rush);
        let check = breakdown
            .components
            .iter()
            .find(|c| c.rule == FeeRuleKind::CheckDebit)
            .unwrap();
        assert!(check.replaced_by_rush);
    }

    #[test]
    fn test_rush_without_flag_does_not_fire() {
        let schedule = test_schedule();
        let context = FeeContext {
            cash_debit_total: dec!(100),
            is_rush: false,
            ..ctx()
        };
        let breakdown = FeeCalculator::compute(&schedule, &context);
        assert_eq!(breakdown.total, dec!(1.00));
    }

    #[test]
    fn test_memo_enumerates_fired_rules() {
        let schedule = test_schedule();
        let context = FeeContext {
            cash_debit_total: dec!(100),
            is_reprint: true,
            ..ctx()
        };
        let breakdown = FeeCalculator::compute(&schedule, &context);
        assert!(breakdown.memo.contains("cash debit fee 1.00"));
        assert!(breakdown.memo.contains("check reprint fee 2.50"));
        assert!(breakdown.memo.contains("total 3.50"));
    }

    #[test]
    fn test_no_rules_fired_memo() {
        let schedule = test_schedule();
        let breakdown = FeeCalculator::compute(&schedule, &ctx());
        assert_eq!(breakdown.memo, "no fee rules fired");
        assert_eq!(breakdown.total, Decimal::ZERO);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let schedule = test_schedule();
        let context = FeeContext {
            cash_debit_total: dec!(312.77),
            check_debit_count: 7,
            missing_account_count: 2,
            is_reprint: true,
            is_rush: true,
            trailing_debit_sum: dec!(55),
        };
        let first = FeeCalculator::compute(&schedule, &context);
        let second = FeeCalculator::compute(&schedule, &context);
        assert_eq!(first, second);
    }
}
