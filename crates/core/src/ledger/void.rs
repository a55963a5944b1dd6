//! Void planning.
//!
//! Voiding never deletes: the original leg flips to `Voided` and the plan
//! carries the exact opposite balance adjustment. Voiding a voided entry
//! is rejected so the adjustment can never apply twice.

use rust_decimal::Decimal;

use cashbook_shared::types::{AccountId, LedgerEntryId};

use super::error::LedgerError;
use super::types::{EntryStatus, LedgerEntry};

/// The state changes a void commits atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidPlan {
    /// The entry being voided.
    pub entry_id: LedgerEntryId,
    /// The account whose balance is adjusted.
    pub account_id: AccountId,
    /// Exact inverse of the entry's signed effect.
    pub adjustment: Decimal,
    /// Audit note recorded on the voided entry.
    pub audit_note: String,
}

/// Plans the void of a ledger entry.
///
/// # Errors
///
/// Returns `AlreadyVoided` for a voided entry and `NotVoidable` for any
/// other non-completed status.
pub fn plan_void(entry: &LedgerEntry) -> Result<VoidPlan, LedgerError> {
    match entry.status {
        EntryStatus::Voided => Err(LedgerError::AlreadyVoided(entry.id)),
        EntryStatus::Pending | EntryStatus::Bounced => {
            Err(LedgerError::NotVoidable(entry.status))
        }
        EntryStatus::Completed => Ok(VoidPlan {
            entry_id: entry.id,
            account_id: entry.account_id,
            adjustment: -entry.signed_amount(),
            audit_note: format!("void of {} leg: {}", entry.kind_label(), entry.memo),
        }),
    }
}

impl LedgerEntry {
    fn kind_label(&self) -> &'static str {
        match self.kind {
            super::types::LegKind::Credit => "credit",
            super::types::LegKind::Debit => "debit",
            super::types::LegKind::Fee => "fee",
            super::types::LegKind::TransferOut => "transfer-out",
            super::types::LegKind::TransferIn => "transfer-in",
        }
    }
}
