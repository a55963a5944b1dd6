//! Shared domain types.

pub mod id;
pub mod money;

pub use id::{AccountId, CheckId, LedgerEntryId, LoanId, ProposalId};
pub use money::{LOAN_EPSILON, is_paid_off, round_money};
