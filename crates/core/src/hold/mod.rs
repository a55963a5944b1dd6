//! Held-check tracking and tag-scoped, FIFO-ordered release.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::HoldError;
pub use service::{BouncePlan, CheckCredit, HoldService, ReleasePlan};
pub use types::{Check, CheckDirection, CheckStatus};
