//! JSON request surface over the unified score service.
//!
//! Requests are tagged by `action`:
//!
//! ```json
//! { "action": "checkIn", "uid": "pioneer-1" }
//! { "action": "mergePoints", "uid": "pioneer-1", "pointsToMerge": 10 }
//! { "action": "walletScan", "uid": "pioneer-1", "walletAddress": "G...", "activity": { ... } }
//! { "action": "saveReputation", "uid": "pioneer-1", "reputationScore": 40, ... }
//! ```
//!
//! `saveReputation` carries the state fields inline, next to `action`.
//!
//! Every response is a JSON object with a `success` flag. Refusals carry a
//! `reason` object with a `code`; malformed requests carry an `error` string.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::atomic::WalletActivityData;
use crate::service::{FailureReason, UnifiedScore, UnifiedScoreService};
use crate::state::{PioneerId, UserReputationState};

/// One client request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ReputationRequest {
    Get {
        #[serde(default)]
        uid: String,
    },
    CanCheckIn {
        #[serde(default)]
        uid: String,
    },
    History {
        #[serde(default)]
        uid: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    CheckIn {
        #[serde(default)]
        uid: String,
    },
    ClaimAdBonus {
        #[serde(default)]
        uid: String,
    },
    /// With `activity`, folds it in directly; without, fetches it through the
    /// configured wallet source.
    #[serde(alias = "syncBlockchainData")]
    WalletScan {
        #[serde(default)]
        uid: String,
        #[serde(default, rename = "walletAddress")]
        wallet_address: Option<String>,
        #[serde(default)]
        activity: Option<WalletActivityData>,
    },
    SaveReputation {
        #[serde(flatten)]
        state: UserReputationState,
    },
    MergePoints {
        #[serde(default)]
        uid: String,
        #[serde(default, rename = "pointsToMerge")]
        points_to_merge: Option<u64>,
    },
}

impl ReputationRequest {
    pub fn uid(&self) -> &str {
        match self {
            ReputationRequest::Get { uid }
            | ReputationRequest::CanCheckIn { uid }
            | ReputationRequest::History { uid, .. }
            | ReputationRequest::CheckIn { uid }
            | ReputationRequest::ClaimAdBonus { uid }
            | ReputationRequest::WalletScan { uid, .. }
            | ReputationRequest::MergePoints { uid, .. } => uid.as_str(),
            ReputationRequest::SaveReputation { state } => state.uid.as_str(),
        }
    }
}

/// Parse `body` and dispatch it. Parse failures become error responses.
pub async fn handle_json(service: &UnifiedScoreService, body: &str) -> Value {
    match serde_json::from_str::<ReputationRequest>(body) {
        Ok(request) => dispatch(service, request).await,
        Err(e) => error_response(format!("malformed request: {e}")),
    }
}

/// Run one request against `service`.
pub async fn dispatch(service: &UnifiedScoreService, request: ReputationRequest) -> Value {
    if request.uid().trim().is_empty() {
        return refusal(&FailureReason::MissingUid);
    }

    match request {
        ReputationRequest::Get { uid } => {
            let uid = PioneerId::new(uid);
            match service.load_state(&uid).await {
                Ok(loaded) => {
                    let unified = UnifiedScore::compose(&loaded.state, &service.config().levels);
                    json!({
                        "success": true,
                        "isNew": loaded.is_new,
                        "source": loaded.source,
                        "state": loaded.state,
                        "unified": unified,
                    })
                }
                Err(e) => error_response(e.to_string()),
            }
        }
        ReputationRequest::CanCheckIn { uid } => {
            match service.check_in_status(&PioneerId::new(uid)).await {
                Ok(status) => json!({
                    "success": true,
                    "canCheckIn": status.can_check_in,
                    "remainingMs": status.remaining_ms,
                    "countdown": status.countdown,
                    "lastCheckInDate": status.last_checkin_date,
                    "currentStreak": status.current_streak,
                    "adBonusAvailable": status.ad_bonus_available,
                }),
                Err(e) => error_response(e.to_string()),
            }
        }
        ReputationRequest::History { uid, limit } => {
            match service.history(&PioneerId::new(uid), limit).await {
                Ok(events) => json!({ "success": true, "events": events }),
                Err(e) => error_response(e.to_string()),
            }
        }
        ReputationRequest::CheckIn { uid } => to_json(&service.check_in(&PioneerId::new(uid)).await),
        ReputationRequest::ClaimAdBonus { uid } => {
            to_json(&service.claim_ad_bonus(&PioneerId::new(uid)).await)
        }
        ReputationRequest::WalletScan {
            uid,
            wallet_address,
            activity,
        } => {
            let uid = PioneerId::new(uid);
            match (activity, wallet_address) {
                (Some(activity), wallet_address) => to_json(
                    &service
                        .sync_blockchain_data(&uid, wallet_address, &activity)
                        .await,
                ),
                (None, Some(wallet_address)) => {
                    to_json(&service.scan_wallet(&uid, &wallet_address).await)
                }
                (None, None) => error_response("walletAddress or activity is required".to_string()),
            }
        }
        ReputationRequest::SaveReputation { state } => to_json(&service.save_state(state).await),
        ReputationRequest::MergePoints {
            uid,
            points_to_merge,
        } => to_json(
            &service
                .merge_checkin_points(&PioneerId::new(uid), points_to_merge)
                .await,
        ),
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| error_response(format!("failed to encode response: {e}")))
}

fn refusal(reason: &FailureReason) -> Value {
    json!({ "success": false, "reason": reason, "message": reason.to_string() })
}

fn error_response(message: String) -> Value {
    json!({ "success": false, "error": message })
}
