//! Property-based tests for loan repayment math.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use cashbook_shared::types::{AccountId, LOAN_EPSILON};

use super::service::LoanService;
use super::types::Loan;

/// Strategy to generate positive amounts (0.01 to 100,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn loan(amount: Decimal) -> Loan {
    Loan::new(
        AccountId::new(),
        amount,
        NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// No money is created or destroyed by a repayment:
    /// `applied + excess == payment`.
    #[test]
    fn prop_repayment_conserves_money(
        principal in positive_amount(),
        payment in positive_amount(),
    ) {
        let split = LoanService::apply_repayment(&loan(principal), payment).unwrap();
        prop_assert_eq!(split.applied + split.excess, payment);
    }

    /// Remaining principal never goes negative and never exceeds the
    /// original principal.
    #[test]
    fn prop_remaining_bounded(
        principal in positive_amount(),
        payment in positive_amount(),
    ) {
        let split = LoanService::apply_repayment(&loan(principal), payment).unwrap();
        prop_assert!(split.remaining >= Decimal::ZERO);
        prop_assert!(split.remaining <= principal);
    }

    /// Paid-off flag agrees with the epsilon tolerance.
    #[test]
    fn prop_paid_off_matches_epsilon(
        principal in positive_amount(),
        payment in positive_amount(),
    ) {
        let split = LoanService::apply_repayment(&loan(principal), payment).unwrap();
        if split.paid_off {
            prop_assert!(principal - split.applied <= LOAN_EPSILON);
            prop_assert_eq!(split.remaining, Decimal::ZERO);
        } else {
            prop_assert!(split.remaining > LOAN_EPSILON);
        }
    }
}
