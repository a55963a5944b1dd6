//! Shared types, errors, and configuration for Cashbook.
//!
//! This crate holds the pieces every other crate depends on: typed IDs,
//! money rounding rules, the engine configuration, and the top-level
//! error taxonomy.

pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
