//! Data structures returned by the unified score service.

use serde::{Deserialize, Serialize};

use crate::atomic::AtomicReputationResult;
use crate::checkin::CheckInRejection;
use crate::level::{LevelInfo, LevelTable};
use crate::notify::ScoreAction;
use crate::state::{PioneerId, UserReputationState};

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Which tier a loaded state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSource {
    Durable,
    Cache,
    /// Nothing stored anywhere; a zeroed state was created.
    Fresh,
}

/// A state together with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedState {
    pub state: UserReputationState,
    pub is_new: bool,
    pub source: StateSource,
}

// ---------------------------------------------------------------------------
// Action results
// ---------------------------------------------------------------------------

/// How far a mutation got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
    /// Written to the durable store.
    Durable,
    /// The durable store was unreachable; only the cache holds the change.
    Tentative,
    /// Nothing was written (rejected action or no-op).
    NotWritten,
}

/// Why an action was refused. Returned inside [`ActionResult`], never as an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("already checked in for this period")]
    AlreadyCheckedIn,

    #[error("ad bonus already claimed for the current check-in")]
    AlreadyClaimed,

    #[error("cannot merge {requested} points, only {available} pending")]
    InsufficientPoints { requested: u64, available: u64 },

    #[error("uid is required")]
    MissingUid,

    #[error("state kept changing underneath after {attempts} attempts")]
    ConcurrentModification { attempts: u32 },

    #[error("reputation score may not drop from {current} to {proposed} without a correction")]
    ScoreRegression { current: u64, proposed: u64 },

    #[error("wallet activity unavailable: {message}")]
    SourceUnavailable { message: String },
}

impl FailureReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::AlreadyCheckedIn => "already_checked_in",
            FailureReason::AlreadyClaimed => "already_claimed",
            FailureReason::InsufficientPoints { .. } => "insufficient_points",
            FailureReason::MissingUid => "missing_uid",
            FailureReason::ConcurrentModification { .. } => "concurrent_modification",
            FailureReason::ScoreRegression { .. } => "score_regression",
            FailureReason::SourceUnavailable { .. } => "source_unavailable",
        }
    }
}

impl From<CheckInRejection> for FailureReason {
    fn from(rejection: CheckInRejection) -> Self {
        match rejection {
            CheckInRejection::AlreadyCheckedIn => FailureReason::AlreadyCheckedIn,
            CheckInRejection::AlreadyClaimed => FailureReason::AlreadyClaimed,
        }
    }
}

/// Outcome of a state-changing operation.
///
/// `state` is the state after the action when it succeeded, or the current
/// state when it was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    pub action: ScoreAction,
    /// Signed change caused by the action; 0 on failure.
    pub points_earned: i64,
    pub reason: Option<FailureReason>,
    pub persistence: Persistence,
    pub state: UserReputationState,
    pub unified: UnifiedScore,
}

/// Outcome of folding wallet activity into a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    #[serde(flatten)]
    pub result: ActionResult,
    /// The freshly computed breakdown (zeroed when not authoritative).
    pub atomic: AtomicReputationResult,
    /// False when the activity came from a failed or timed-out fetch.
    pub authoritative: bool,
    /// Number of component-change events appended.
    pub events_appended: usize,
}

// ---------------------------------------------------------------------------
// Unified score
// ---------------------------------------------------------------------------

/// The single score view shown to a pioneer.
///
/// `total` is `blockchain_score + merged_checkin_points +
/// daily_checkin_points` clamped to the level cap, so each point source is
/// counted exactly once. `reputation_score` is the durable ledger and is
/// reported alongside, not added in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedScore {
    pub uid: PioneerId,
    pub total: u64,
    pub blockchain_score: u64,
    #[serde(rename = "checkInPoints")]
    pub checkin_points: u64,
    #[serde(rename = "dailyCheckInPoints")]
    pub daily_checkin_points: u64,
    #[serde(rename = "mergedCheckInPoints")]
    pub merged_checkin_points: u64,
    pub reputation_score: u64,
    pub level: LevelInfo,
    pub streak: u32,
    pub longest_streak: u32,
    #[serde(rename = "totalCheckInDays")]
    pub total_checkin_days: u32,
    pub last_updated: u64,
}

impl UnifiedScore {
    pub fn compose(state: &UserReputationState, levels: &LevelTable) -> Self {
        let raw = i64::try_from(state.engagement_total()).unwrap_or(i64::MAX);
        let total = levels.clamp(raw);
        Self {
            uid: state.uid.clone(),
            total,
            blockchain_score: state.blockchain_score,
            checkin_points: state
                .merged_checkin_points
                .saturating_add(state.daily_checkin_points),
            daily_checkin_points: state.daily_checkin_points,
            merged_checkin_points: state.merged_checkin_points,
            reputation_score: state.reputation_score,
            level: levels.level_for(raw),
            streak: state.streak,
            longest_streak: state.longest_streak,
            total_checkin_days: state.total_checkin_days,
            last_updated: state.last_updated,
        }
    }
}
