//! Pioneer Reputation: bounded, auditable trust scores for network pioneers.
//!
//! Combines on-chain wallet activity, staking, daily check-ins, ad bonuses,
//! and referrals into one score with a level, persisted across a durable
//! store and a best-effort cache.

pub mod api;
pub mod atomic;
pub mod checkin;
pub mod config;
pub mod error;
pub mod level;
pub mod notify;
pub mod rules;
pub mod service;
pub mod source;
pub mod state;
pub mod storage;
pub mod time;

// Re-export primary types
pub use config::EngineConfig;
pub use error::{ReputationError, Result};
pub use state::{CheckInId, EventId, PioneerId, ScoreEvent, UserReputationState};

// Re-export scoring types
pub use atomic::{AtomicReputationResult, AtomicSettings, NetworkActivity, WalletActivityData};
pub use level::{LevelInfo, LevelTable, LevelThreshold};
pub use rules::{NetworkMode, RuleCategory, RuleId, RulesRegistry, ScoringRule};

// Re-export check-in types
pub use checkin::{AdBonusAward, CheckInAward, CheckInPolicy, CheckInRejection, CheckInStatus};

// Re-export service types
pub use notify::{ScoreAction, ScoreCallback, ScoreNotifier, ScoreUpdate, Subscription};
pub use service::{
    ActionResult, FailureReason, LoadedState, Persistence, StateSource, SyncResult, UnifiedScore,
    UnifiedScoreService,
};
pub use source::{FetchedActivity, StaticActivitySource, WalletActivitySource};
pub use storage::{CacheAdapter, JsonFileStore, MemoryStore, PersistenceAdapter, WriteOutcome};
pub use time::{Clock, ManualClock, SystemClock};
