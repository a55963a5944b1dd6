//! Transaction request model, validation, leg planning, and voids.

pub mod error;
pub mod plan;
pub mod types;
pub mod validation;
pub mod void;

pub use error::LedgerError;
pub use plan::{PlanContext, PlanOutcome, Planner, TransactionPlan};
pub use types::{
    Account, AccountSnapshot, CheckDeposit, CheckWithdrawal, Decisions, EntryStatus, LedgerEntry,
    LegKind, LoanAction, NewEntry, PendingDecision, RepaymentDecision, ShortfallDecision,
    TransactionRequest, TransferLeg,
};
pub use void::{VoidPlan, plan_void};
