//! Per-pioneer reputation state and the score events embedded in it.
//!
//! [`UserReputationState`] is the aggregate root: one document per `uid`,
//! persisted flat and mutated only through the score service. Score events
//! are append-only and kept in bounded history lists.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::atomic::AtomicReputationResult;
use crate::rules::RuleId;

/// Default number of events retained per history list.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

static EVENT_NONCE: AtomicU64 = AtomicU64::new(0);

/// Derive a short, prefixed id: SHA-256 of `input`, first 16 bytes, base58.
fn derive_id(prefix: &str, input: &str) -> String {
    let hash = Sha256::digest(input.as_bytes());
    let encoded = bs58::encode(&hash[..16]).into_string();
    format!("{prefix}_{encoded}")
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// A pioneer's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PioneerId(pub String);

impl PioneerId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Whether this id is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PioneerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PioneerId {
    fn from(uid: &str) -> Self {
        Self(uid.to_string())
    }
}

/// Unique identifier for a score event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one check-in; scopes the ad bonus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckInId(pub String);

impl CheckInId {
    /// Derive the id for the `day_number`-th check-in of `uid` at `timestamp`.
    pub fn derive(uid: &PioneerId, timestamp: u64, day_number: u32) -> Self {
        Self(derive_id(
            "chk",
            &format!("checkin:{}:{}:{}", uid.0, timestamp, day_number),
        ))
    }
}

impl std::fmt::Display for CheckInId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Score event
// ---------------------------------------------------------------------------

/// An immutable record of points awarded (or deducted) by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEvent {
    pub id: EventId,
    pub rule_id: RuleId,
    pub points: i64,
    pub timestamp: u64,
    pub uid: PioneerId,
    pub wallet_address: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl ScoreEvent {
    pub fn new(uid: &PioneerId, rule_id: impl Into<RuleId>, points: i64, timestamp: u64) -> Self {
        let rule_id = rule_id.into();
        let nonce = EVENT_NONCE.fetch_add(1, Ordering::Relaxed);
        let id = EventId(derive_id(
            "evt",
            &format!("event:{}:{}:{}:{}:{}", uid.0, rule_id.0, points, timestamp, nonce),
        ));
        Self {
            id,
            rule_id,
            points,
            timestamp,
            uid: uid.clone(),
            wallet_address: None,
            metadata: None,
        }
    }

    pub fn with_wallet(mut self, wallet_address: Option<String>) -> Self {
        self.wallet_address = wallet_address;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ---------------------------------------------------------------------------
// User reputation state
// ---------------------------------------------------------------------------

/// Everything the engine knows about one pioneer.
///
/// Point buckets:
/// - `reputation_score`: durable ledger; grows through merges and discrete
///   blockchain events, shrinks only through audited corrections.
/// - `blockchain_score`: latest wallet-derived score, replaced on each sync.
/// - `daily_checkin_points`: engagement points not yet merged.
/// - `merged_checkin_points`: engagement points already merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReputationState {
    pub uid: PioneerId,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub reputation_score: u64,
    #[serde(default)]
    pub blockchain_score: u64,
    #[serde(default, rename = "dailyCheckInPoints")]
    pub daily_checkin_points: u64,
    #[serde(default, rename = "mergedCheckInPoints")]
    pub merged_checkin_points: u64,
    #[serde(default, rename = "totalCheckInDays")]
    pub total_checkin_days: u32,
    #[serde(default, rename = "lastCheckIn")]
    pub last_checkin: Option<u64>,
    #[serde(default, rename = "lastCheckInId")]
    pub last_checkin_id: Option<CheckInId>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub last_ad_watch: Option<u64>,
    #[serde(default, rename = "adClaimedForCheckIn")]
    pub ad_claimed_for_checkin: Option<CheckInId>,
    #[serde(default)]
    pub interaction_history: Vec<ScoreEvent>,
    #[serde(default)]
    pub blockchain_events: Vec<ScoreEvent>,
    #[serde(default)]
    pub blockchain_snapshot: Option<AtomicReputationResult>,
    #[serde(default)]
    pub last_updated: u64,
    #[serde(default)]
    pub last_blockchain_sync: Option<u64>,
    /// Optimistic concurrency token; bumped on every durable write.
    #[serde(default)]
    pub version: u64,
}

impl UserReputationState {
    /// A zeroed state for a pioneer seen for the first time.
    pub fn new(uid: PioneerId, now: u64) -> Self {
        Self {
            uid,
            wallet_address: None,
            reputation_score: 0,
            blockchain_score: 0,
            daily_checkin_points: 0,
            merged_checkin_points: 0,
            total_checkin_days: 0,
            last_checkin: None,
            last_checkin_id: None,
            streak: 0,
            longest_streak: 0,
            last_ad_watch: None,
            ad_claimed_for_checkin: None,
            interaction_history: Vec::new(),
            blockchain_events: Vec::new(),
            blockchain_snapshot: None,
            last_updated: now,
            last_blockchain_sync: None,
            version: 0,
        }
    }

    /// Whether the ad bonus for the current check-in was already granted.
    pub fn ad_bonus_claimed(&self) -> bool {
        self.last_checkin_id.is_some() && self.ad_claimed_for_checkin == self.last_checkin_id
    }

    /// Sum of every point bucket, each counted once.
    pub fn engagement_total(&self) -> u64 {
        self.blockchain_score
            .saturating_add(self.merged_checkin_points)
            .saturating_add(self.daily_checkin_points)
    }

    /// Whether this copy is newer than `other`: a higher version, or the same
    /// version written later.
    pub fn supersedes(&self, other: &UserReputationState) -> bool {
        (self.version, self.last_updated) > (other.version, other.last_updated)
    }

    /// Append to the interaction history, dropping the oldest beyond `limit`.
    pub fn push_interaction(&mut self, event: ScoreEvent, limit: usize) {
        push_bounded(&mut self.interaction_history, event, limit);
    }

    /// Append to the blockchain event history, dropping the oldest beyond `limit`.
    pub fn push_blockchain_event(&mut self, event: ScoreEvent, limit: usize) {
        push_bounded(&mut self.blockchain_events, event, limit);
    }
}

fn push_bounded(list: &mut Vec<ScoreEvent>, event: ScoreEvent, limit: usize) {
    list.push(event);
    if list.len() > limit {
        let excess = list.len() - limit;
        list.drain(..excess);
    }
}
