//! Atomic reputation: the wallet-activity component of a pioneer's score.
//!
//! Computed fresh from a full activity snapshot on every sync and never
//! accumulated across syncs.

pub mod engine;
pub mod types;

pub use engine::{calculate, STAKING_AMOUNT_UNIT};
pub use types::{AtomicReputationResult, AtomicSettings, NetworkActivity, WalletActivityData};
