//! Check record domain types.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashbook_shared::types::{AccountId, CheckId};

/// Whether a check flowed into or out of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckDirection {
    /// Deposited into the account (a `checks_in` record).
    Deposited,
    /// Written against the account (a `checks_out` record).
    Issued,
}

/// Check lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Recorded, funds not yet settled.
    Pending,
    /// Deposited funds withheld pending risk review.
    Hold,
    /// Fully settled; `cleared_amount == amount`.
    Cleared,
    /// Returned unpaid.
    Bounced,
    /// Voided with an audit trail; never deleted.
    Voided,
}

/// A check record.
///
/// Invariant: `0 <= cleared_amount <= amount`, and status is `Cleared`
/// exactly when `cleared_amount == amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Unique identifier.
    pub id: CheckId,
    /// The account the check was deposited to (or drawn on).
    pub account_id: AccountId,
    /// Flow direction.
    pub direction: CheckDirection,
    /// Face amount.
    pub amount: Decimal,
    /// Portion already released to the account balance.
    pub cleared_amount: Decimal,
    /// Printed check number.
    pub check_number: String,
    /// Counterparty account reference, if known.
    pub counterparty_account: Option<String>,
    /// Free-form tags grouping holds for batched release.
    pub tags: BTreeSet<String>,
    /// Date of deposit (or issue).
    pub deposit_date: NaiveDate,
    /// Lifecycle status.
    pub status: CheckStatus,
}

impl Check {
    /// Amount still withheld from the account.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.amount - self.cleared_amount
    }

    /// True if release operations may credit funds from this check.
    #[must_use]
    pub fn is_releasable(&self) -> bool {
        self.direction == CheckDirection::Deposited
            && matches!(self.status, CheckStatus::Pending | CheckStatus::Hold)
            && self.remaining() > Decimal::ZERO
    }

    /// True if the check carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn held_check(amount: Decimal, cleared: Decimal) -> Check {
        Check {
            id: CheckId::new(),
            account_id: AccountId::new(),
            direction: CheckDirection::Deposited,
            amount,
            cleared_amount: cleared,
            check_number: "1001".to_string(),
            counterparty_account: None,
            tags: BTreeSet::new(),
            deposit_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            status: CheckStatus::Hold,
        }
    }

    #[test]
    fn test_remaining() {
        assert_eq!(held_check(dec!(40), dec!(15)).remaining(), dec!(25));
        assert_eq!(held_check(dec!(40), dec!(40)).remaining(), Decimal::ZERO);
    }

    #[test]
    fn test_is_releasable() {
        assert!(held_check(dec!(40), dec!(0)).is_releasable());
        assert!(!held_check(dec!(40), dec!(40)).is_releasable());

        let mut bounced = held_check(dec!(40), dec!(0));
        bounced.status = CheckStatus::Bounced;
        assert!(!bounced.is_releasable());

        let mut issued = held_check(dec!(40), dec!(0));
        issued.direction = CheckDirection::Issued;
        assert!(!issued.is_releasable());
    }

    #[test]
    fn test_has_tag() {
        let mut check = held_check(dec!(10), dec!(0));
        check.tags.insert("payroll".to_string());
        assert!(check.has_tag("payroll"));
        assert!(!check.has_tag("vendor"));
    }
}
