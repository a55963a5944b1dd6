//! Loan repayment splits and overpayment cascades.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LoanError;
pub use service::{LoanService, RepaymentSplit};
pub use types::{Loan, LoanStatus, OverpaymentDecision};
