//! Transaction engine: storage abstraction, per-account serialization,
//! and the two-phase transaction composer.
//!
//! The core crate decides *what* should happen (plans); this crate decides
//! *when and atomically* it happens. Every mutation flows through a single
//! `CommitBatch` applied by the store in one shot, so a failed commit
//! leaves no partial state behind.

pub mod composer;
pub mod store;

pub use composer::{
    BounceReceipt, CommitReceipt, ProposalSummary, ProposeOutcome, RepaymentReceipt,
    TransactionComposer, VoidReceipt,
};
pub use store::{CheckUpdate, CommitBatch, EntryUpdate, LedgerStore, LoanUpdate, MemoryStore};
