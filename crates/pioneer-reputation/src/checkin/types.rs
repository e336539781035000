//! Data structures for the daily check-in state machine.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::state::CheckInId;

/// The parts of the engine configuration the check-in machine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInPolicy {
    pub continuity_window_ms: u64,
    pub utc_offset_minutes: i32,
    pub history_limit: usize,
}

impl From<&EngineConfig> for CheckInPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            continuity_window_ms: config.continuity_window_ms,
            utc_offset_minutes: config.utc_offset_minutes,
            history_limit: config.history_limit,
        }
    }
}

impl Default for CheckInPolicy {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

/// Answer to "may this pioneer check in now?".
///
/// A negative answer is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStatus {
    pub can_check_in: bool,
    /// Milliseconds until the next check-in opens; 0 when open.
    pub remaining_ms: u64,
    /// `remaining_ms` as `HH:MM:SS`.
    pub countdown: String,
    /// Local calendar date of the last check-in (`YYYY-MM-DD`).
    #[serde(rename = "lastCheckInDate")]
    pub last_checkin_date: Option<String>,
    pub current_streak: u32,
    pub ad_bonus_available: bool,
}

/// What a successful check-in awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInAward {
    #[serde(rename = "checkInId")]
    pub checkin_id: CheckInId,
    pub base_points: i64,
    pub streak_bonus: i64,
    pub points_earned: i64,
    pub streak: u32,
    pub streak_continued: bool,
}

/// What a successful ad-bonus claim awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdBonusAward {
    #[serde(rename = "checkInId")]
    pub checkin_id: CheckInId,
    pub points_earned: i64,
}

/// Why a check-in transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckInRejection {
    #[error("already checked in for this period")]
    AlreadyCheckedIn,

    #[error("ad bonus already claimed for the current check-in")]
    AlreadyClaimed,
}
