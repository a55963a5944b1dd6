//! Property-based tests for hold release allocation.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use cashbook_shared::types::{AccountId, CheckId};

use super::service::HoldService;
use super::types::{Check, CheckDirection, CheckStatus};

fn check_strategy() -> impl Strategy<Value = Check> {
    (1i64..1_000_000i64, 0u32..200u32).prop_map(|(cents, day_offset)| {
        let amount = Decimal::new(cents, 2);
        let base = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        Check {
            id: CheckId::new(),
            account_id: AccountId::new(),
            direction: CheckDirection::Deposited,
            amount,
            cleared_amount: Decimal::ZERO,
            check_number: "1001".to_string(),
            counterparty_account: None,
            tags: BTreeSet::from(["x".to_string()]),
            deposit_date: base + chrono::Days::new(u64::from(day_offset)),
            status: CheckStatus::Hold,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The allocation never credits more than the budget, never more than
    /// a check's remainder, and accounts for every cent:
    /// `credited + unallocated == budget` when eligible checks exist.
    #[test]
    fn prop_partial_release_conserves_budget(
        checks in prop::collection::vec(check_strategy(), 0..12),
        budget_cents in 1i64..2_000_000i64,
    ) {
        let budget = Decimal::new(budget_cents, 2);
        let plan = HoldService::release_partial("x", budget, &checks).unwrap();

        prop_assert_eq!(plan.total_credited() + plan.unallocated_budget, budget);
        for credit in &plan.credits {
            let check = checks.iter().find(|c| c.id == credit.check_id).unwrap();
            prop_assert!(credit.amount <= check.remaining());
            prop_assert!(credit.new_cleared_amount <= check.amount);
        }
    }

    /// Cleared status agrees with the cleared-amount invariant.
    #[test]
    fn prop_cleared_iff_fully_funded(
        checks in prop::collection::vec(check_strategy(), 1..12),
        budget_cents in 1i64..2_000_000i64,
    ) {
        let budget = Decimal::new(budget_cents, 2);
        let plan = HoldService::release_partial("x", budget, &checks).unwrap();

        for credit in &plan.credits {
            let check = checks.iter().find(|c| c.id == credit.check_id).unwrap();
            let fully_funded = credit.new_cleared_amount == check.amount;
            prop_assert_eq!(credit.new_status == CheckStatus::Cleared, fully_funded);
        }
    }

    /// Allocation is FIFO: a check receives funds only if every older
    /// eligible check was fully funded first.
    #[test]
    fn prop_allocation_is_fifo(
        checks in prop::collection::vec(check_strategy(), 1..12),
        budget_cents in 1i64..2_000_000i64,
    ) {
        let budget = Decimal::new(budget_cents, 2);
        let plan = HoldService::release_partial("x", budget, &checks).unwrap();

        let mut sorted: Vec<&Check> = checks.iter().collect();
        sorted.sort_by_key(|c| (c.deposit_date, c.id));

        let funded: Vec<CheckId> = plan.credits.iter().map(|c| c.check_id).collect();
        for (i, check) in sorted.iter().enumerate() {
            if funded.contains(&check.id) {
                // Every older check must appear earlier and be fully funded,
                // except possibly the last credit in the plan.
                for older in &sorted[..i] {
                    let credit = plan.credits.iter().find(|c| c.check_id == older.id);
                    prop_assert!(credit.is_some());
                }
            }
        }
    }
}
