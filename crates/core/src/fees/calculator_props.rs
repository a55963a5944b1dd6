//! Property-based tests for the fee calculator.
//!
//! - Fee determinism: same schedule + context always yields the same
//!   breakdown and memo.
//! - Totals equal the sum of surviving components and are never negative.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::calculator::{FeeCalculator, FeeContext};
use super::schedule::{
    CashDebitRule, FeeBasis, FeeSchedule, ReprintRule, RushRule, Tier, TieredRule, WaiverPolicy,
};
use cashbook_shared::types::round_money;

/// Strategy to generate dollar amounts (0.00 to 25,000.00).
fn dollar_amount() -> impl Strategy<Value = Decimal> {
    (0i64..2_500_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a fee basis.
fn fee_basis() -> impl Strategy<Value = FeeBasis> {
    prop_oneof![
        (0i64..10_000i64).prop_map(|cents| FeeBasis::Flat(Decimal::new(cents, 2))),
        (0i64..10_000i64).prop_map(|bp| FeeBasis::Percent(Decimal::new(bp, 2))),
        (0i64..1_000i64).prop_map(|cents| FeeBasis::PerItem(Decimal::new(cents, 2))),
    ]
}

/// Strategy to generate a waiver policy.
fn waiver_policy() -> impl Strategy<Value = WaiverPolicy> {
    prop_oneof![
        Just(WaiverPolicy::AlwaysCharge),
        Just(WaiverPolicy::NeverCharge),
        (1i64..100_000i64, 1u32..365u32).prop_map(|(cents, days)| WaiverPolicy::Conditional {
            threshold: Decimal::new(cents, 2),
            window_days: days,
        }),
    ]
}

/// Strategy to generate a contiguous tier ladder over counts 1..=30.
fn count_tiers() -> impl Strategy<Value = TieredRule> {
    (prop::collection::vec(fee_basis(), 1..4), any::<bool>()).prop_map(|(fees, enabled)| {
        let step = Decimal::from(30 / i64::try_from(fees.len()).unwrap_or(1).max(1));
        let mut tiers = Vec::new();
        let mut from = Decimal::ONE;
        for fee in fees {
            let to = from + step;
            tiers.push(Tier { from, to, fee });
            from = to + Decimal::ONE;
        }
        TieredRule { enabled, tiers }
    })
}

fn schedule_strategy() -> impl Strategy<Value = FeeSchedule> {
    (
        any::<bool>(),
        (any::<bool>(), fee_basis(), waiver_policy()),
        count_tiers(),
        count_tiers(),
        (any::<bool>(), 0i64..1_000i64),
        (any::<bool>(), any::<bool>(), count_tiers(), count_tiers()),
    )
        .prop_map(
            |(enabled, (cd_enabled, basis, waiver), check_debit, missing, (rp_enabled, rp_fee), (rush_enabled, overwrite, cash_tiers, check_tiers))| {
                FeeSchedule {
                    enabled,
                    cash_debit: CashDebitRule {
                        enabled: cd_enabled,
                        basis,
                        waiver,
                    },
                    check_debit,
                    missing_account_credit: missing,
                    check_reprint: ReprintRule {
                        enabled: rp_enabled,
                        fee: Decimal::new(rp_fee, 2),
                    },
                    rush: RushRule {
                        enabled: rush_enabled,
                        overwrite,
                        cash_tiers,
                        check_tiers,
                    },
                }
            },
        )
}

fn context_strategy() -> impl Strategy<Value = FeeContext> {
    (
        dollar_amount(),
        0u32..40u32,
        0u32..40u32,
        any::<bool>(),
        any::<bool>(),
        dollar_amount(),
    )
        .prop_map(
            |(cash, checks, missing, reprint, rush, trailing)| FeeContext {
                cash_debit_total: cash,
                check_debit_count: checks,
                missing_account_count: missing,
                is_reprint: reprint,
                is_rush: rush,
                trailing_debit_sum: trailing,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Same inputs always produce the identical breakdown and memo,
    /// regardless of call order.
    #[test]
    fn prop_compute_is_deterministic(
        schedule in schedule_strategy(),
        context in context_strategy(),
    ) {
        let first = FeeCalculator::compute(&schedule, &context);
        let second = FeeCalculator::compute(&schedule, &context);
        prop_assert_eq!(first, second);
    }

    /// The total is never negative and equals the rounded sum of
    /// surviving components.
    #[test]
    fn prop_total_matches_surviving_components(
        schedule in schedule_strategy(),
        context in context_strategy(),
    ) {
        let breakdown = FeeCalculator::compute(&schedule, &context);
        prop_assert!(breakdown.total >= Decimal::ZERO);

        let surviving: Decimal = breakdown
            .components
            .iter()
            .filter(|c| c.survives())
            .map(|c| c.amount)
            .sum();
        prop_assert_eq!(breakdown.total, round_money(surviving));
    }

    /// A disabled schedule charges nothing, whatever the context.
    #[test]
    fn prop_disabled_schedule_is_free(
        mut schedule in schedule_strategy(),
        context in context_strategy(),
    ) {
        schedule.enabled = false;
        let breakdown = FeeCalculator::compute(&schedule, &context);
        prop_assert_eq!(breakdown.total, Decimal::ZERO);
        prop_assert!(breakdown.components.is_empty());
    }
}
