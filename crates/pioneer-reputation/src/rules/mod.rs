//! Scoring rules: the static catalog every point award is resolved against.
//!
//! The rules module provides:
//! - Rule identifiers, categories, and network attribution
//! - Point resolution with magnitude caps
//! - Testnet scaling for network-category rules

pub mod registry;
pub mod types;

pub use registry::{RulesRegistry, DEFAULT_TESTNET_MULTIPLIER};
pub use types::{NetworkMode, RuleCategory, RuleId, ScoringRule};
