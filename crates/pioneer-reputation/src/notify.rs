//! Score change notifications.
//!
//! The score service publishes a [`ScoreUpdate`] after every mutation that
//! reached storage. Subscribers register a callback, optionally filtered to
//! one pioneer, and keep the returned [`Subscription`] to unsubscribe later.
//! Callbacks run synchronously on the publishing task and must not block.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};

use crate::service::UnifiedScore;
use crate::state::PioneerId;

/// The mutation that produced an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreAction {
    CheckIn,
    AdBonus,
    Merge,
    BlockchainSync,
    BlockchainEvent,
    Correction,
    Save,
}

impl ScoreAction {
    pub fn as_tag(&self) -> &'static str {
        match self {
            ScoreAction::CheckIn => "check_in",
            ScoreAction::AdBonus => "ad_bonus",
            ScoreAction::Merge => "merge",
            ScoreAction::BlockchainSync => "blockchain_sync",
            ScoreAction::BlockchainEvent => "blockchain_event",
            ScoreAction::Correction => "correction",
            ScoreAction::Save => "save",
        }
    }
}

impl std::fmt::Display for ScoreAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Payload delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdate {
    pub uid: PioneerId,
    pub action: ScoreAction,
    pub unified: UnifiedScore,
}

pub type ScoreCallback = Arc<dyn Fn(&ScoreUpdate) + Send + Sync>;

struct Subscriber {
    filter: Option<PioneerId>,
    callback: ScoreCallback,
}

type SubscriberMap = Mutex<BTreeMap<u64, Subscriber>>;

/// Fan-out point for score updates.
#[derive(Default)]
pub struct ScoreNotifier {
    subscribers: Arc<SubscriberMap>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for ScoreNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ScoreNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for updates about `filter` (or everyone if `None`).
    pub fn subscribe(&self, filter: Option<PioneerId>, callback: ScoreCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.insert(id, Subscriber { filter, callback });
        }
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Deliver `update` to every matching subscriber.
    pub fn publish(&self, update: &ScoreUpdate) {
        // Snapshot the callbacks so a callback may subscribe or unsubscribe.
        let callbacks: Vec<ScoreCallback> = match self.subscribers.lock() {
            Ok(subscribers) => subscribers
                .values()
                .filter(|s| s.filter.as_ref().map_or(true, |uid| *uid == update.uid))
                .map(|s| Arc::clone(&s.callback))
                .collect(),
            Err(_) => return,
        };
        log::debug!(
            "publishing {} for {} to {} subscriber(s)",
            update.action,
            update.uid,
            callbacks.len()
        );
        for callback in callbacks {
            callback(update);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Handle returned by [`ScoreNotifier::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to stop receiving updates.
#[must_use = "keep the subscription to be able to unsubscribe"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    subscribers: Weak<SubscriberMap>,
}

impl Subscription {
    /// Stop receiving updates. Returns whether the subscription was still live.
    pub fn unsubscribe(self) -> bool {
        let Some(subscribers) = self.subscribers.upgrade() else {
            return false;
        };
        let Ok(mut map) = subscribers.lock() else {
            return false;
        };
        map.remove(&self.id).is_some()
    }
}
