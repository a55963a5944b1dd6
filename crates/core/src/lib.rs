//! Core business logic for Cashbook.
//!
//! This crate contains pure business logic with ZERO async or database
//! dependencies. All domain types, validation rules, and calculations
//! live here.
//!
//! # Modules
//!
//! - `fees` - Tiered/waiver fee schedule and the pure fee calculator
//! - `ledger` - Transaction request model, validation, leg planning, voids
//! - `loan` - Loan repayment splits and overpayment cascades
//! - `hold` - Tag-grouped FIFO release of held check funds

pub mod fees;
pub mod hold;
pub mod ledger;
pub mod loan;
