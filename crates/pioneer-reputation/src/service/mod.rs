//! Unified score service: the aggregator over rules, check-ins, and
//! wallet activity.
//!
//! The service module provides:
//! - Two-tier state loading (durable, cache, fresh)
//! - Check-in, ad bonus, and point merging with race-safe writes
//! - Blockchain sync with per-component change events
//! - Audited score corrections and whole-state saves
//! - The unified score view and change notifications

pub mod engine;
pub mod types;

pub use types::{
    ActionResult, FailureReason, LoadedState, Persistence, StateSource, SyncResult, UnifiedScore,
};

pub use engine::UnifiedScoreService;
