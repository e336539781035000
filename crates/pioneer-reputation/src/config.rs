//! Engine configuration.
//!
//! Loaded from a JSON document; every field has a default, so an empty
//! object `{}` is a valid configuration.
//!
//! ```json
//! {
//!     "continuity_window_ms": 172800000,
//!     "utc_offset_minutes": 0,
//!     "history_limit": 100,
//!     "wallet_fetch_timeout_ms": 8000,
//!     "testnet_multiplier": 0.25,
//!     "levels": [ { "level": 1, "rank": "Newcomer", "min_score": 0, "max_score": 500 } ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::atomic::AtomicSettings;
use crate::error::{ReputationError, Result};
use crate::level::LevelTable;
use crate::rules::{RulesRegistry, DEFAULT_TESTNET_MULTIPLIER};
use crate::state::DEFAULT_HISTORY_LIMIT;
use crate::time::{MILLIS_PER_HOUR, MILLIS_PER_SECOND};

/// Tunables for the reputation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A check-in within this long of the previous one continues the streak.
    pub continuity_window_ms: u64,
    /// Offset used to decide which calendar day a check-in falls on.
    pub utc_offset_minutes: i32,
    /// Events kept per history list.
    pub history_limit: usize,
    /// Upper bound on a wallet activity fetch.
    pub wallet_fetch_timeout_ms: u64,
    /// Conditional-write attempts before giving up on a contended uid.
    pub max_write_attempts: u32,
    pub testnet_multiplier: f64,
    pub external_transfer_allowance: u64,
    pub suspicious_penalty_cap: u64,
    pub levels: LevelTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            continuity_window_ms: 48 * MILLIS_PER_HOUR,
            utc_offset_minutes: 0,
            history_limit: DEFAULT_HISTORY_LIMIT,
            wallet_fetch_timeout_ms: 8 * MILLIS_PER_SECOND,
            max_write_attempts: 3,
            testnet_multiplier: DEFAULT_TESTNET_MULTIPLIER,
            external_transfer_allowance: 3,
            suspicious_penalty_cap: 400,
            levels: LevelTable::standard(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a JSON string and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            ReputationError::InvalidConfig(format!("failed to parse configuration: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(|e| match e {
            ReputationError::InvalidConfig(msg) => {
                ReputationError::InvalidConfig(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Reject configurations that would make the engine misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.continuity_window_ms == 0 {
            return Err(ReputationError::InvalidConfig(
                "continuity_window_ms must be > 0".to_string(),
            ));
        }
        if !(-14 * 60..=14 * 60).contains(&self.utc_offset_minutes) {
            return Err(ReputationError::InvalidConfig(format!(
                "utc_offset_minutes must be within ±840, got {}",
                self.utc_offset_minutes
            )));
        }
        if self.history_limit == 0 {
            return Err(ReputationError::InvalidConfig(
                "history_limit must be > 0".to_string(),
            ));
        }
        if self.max_write_attempts == 0 {
            return Err(ReputationError::InvalidConfig(
                "max_write_attempts must be > 0".to_string(),
            ));
        }
        self.rules().validate()
    }

    /// The standard rule catalog with this configuration's testnet multiplier.
    pub fn rules(&self) -> RulesRegistry {
        RulesRegistry::standard().with_testnet_multiplier(self.testnet_multiplier)
    }

    pub fn atomic_settings(&self) -> AtomicSettings {
        AtomicSettings {
            cap: self.levels.cap(),
            external_transfer_allowance: self.external_transfer_allowance,
            suspicious_penalty_cap: self.suspicious_penalty_cap,
        }
    }
}
