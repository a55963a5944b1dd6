//! Engine configuration management.
//!
//! Configuration is loaded once per process and passed into the engine as
//! an explicit argument; nothing reads mutable global settings at
//! transaction time.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Per-transaction cap applied to both total credit and total debit.
    #[serde(default = "default_transaction_cap")]
    pub transaction_cap: Decimal,
    /// Seconds a pending proposal stays valid while awaiting a caller decision.
    #[serde(default = "default_proposal_ttl_secs")]
    pub proposal_ttl_secs: u64,
    /// Hold policy for deposited checks.
    #[serde(default)]
    pub hold: HoldPolicy,
}

/// Policy knobs for held-check bounce review.
#[derive(Debug, Clone, Deserialize)]
pub struct HoldPolicy {
    /// Days after deposit before a held check enters the bounce-review window.
    #[serde(default = "default_bounce_threshold_days")]
    pub bounce_threshold_days: u32,
    /// Length of the review window in days; unresolved holds past
    /// `bounce_threshold_days + period_days` are flagged as bounce candidates.
    #[serde(default = "default_period_days")]
    pub period_days: u32,
}

fn default_transaction_cap() -> Decimal {
    Decimal::from(25_000)
}

fn default_proposal_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_bounce_threshold_days() -> u32 {
    14
}

fn default_period_days() -> u32 {
    30
}

impl Default for HoldPolicy {
    fn default() -> Self {
        Self {
            bounce_threshold_days: default_bounce_threshold_days(),
            period_days: default_period_days(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transaction_cap: default_transaction_cap(),
            proposal_ttl_secs: default_proposal_ttl_secs(),
            hold: HoldPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CASHBOOK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
