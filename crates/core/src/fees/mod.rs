//! Fee schedule configuration and the pure fee calculator.

pub mod calculator;
pub mod error;
pub mod schedule;

#[cfg(test)]
mod calculator_props;

pub use calculator::{FeeBreakdown, FeeCalculator, FeeComponent, FeeContext, FeeRuleKind};
pub use error::ScheduleError;
pub use schedule::{
    CashDebitRule, FeeBasis, FeeSchedule, ReprintRule, RushRule, Tier, TieredRule, WaiverPolicy,
};
