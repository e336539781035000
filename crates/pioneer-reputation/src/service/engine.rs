//! Unified score service: loads, mutates, and persists pioneer state.
//!
//! Every mutation follows the same path: read the durable state with its
//! version, apply a pure transition, then write it back with
//! `compare_and_set`. A version conflict means another request for the same
//! uid won the race; the transition is re-validated against the fresh state,
//! so a repeated check-in is refused rather than double-awarded. When the
//! durable store is unreachable the change lands in the cache only and the
//! result is flagged [`Persistence::Tentative`].

use std::sync::Arc;

use serde_json::json;

use crate::atomic::{calculate, AtomicReputationResult, WalletActivityData};
use crate::checkin::{self, CheckInPolicy, CheckInStatus};
use crate::config::EngineConfig;
use crate::error::{ReputationError, Result};
use crate::notify::{ScoreAction, ScoreCallback, ScoreNotifier, ScoreUpdate, Subscription};
use crate::rules::{RuleId, RulesRegistry};
use crate::source::{fetch_with_timeout, FetchedActivity, WalletActivitySource};
use crate::state::{PioneerId, ScoreEvent, UserReputationState};
use crate::storage::{CacheAdapter, PersistenceAdapter, WriteOutcome};
use crate::time::{Clock, SystemClock};

use super::types::*;

/// A transition applied inside the write loop.
///
/// `Ok(Some((points, detail)))` changed the state, `Ok(None)` left it as is,
/// `Err` refused the action.
type Transition<T> = std::result::Result<Option<(i64, T)>, FailureReason>;

/// The scoring engine's front door.
pub struct UnifiedScoreService {
    persistence: Arc<dyn PersistenceAdapter>,
    cache: Arc<dyn CacheAdapter>,
    clock: Arc<dyn Clock>,
    source: Option<Arc<dyn WalletActivitySource>>,
    config: Arc<EngineConfig>,
    registry: Arc<RulesRegistry>,
    policy: CheckInPolicy,
    notifier: ScoreNotifier,
}

impl std::fmt::Debug for UnifiedScoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnifiedScoreService")
            .field("config", &self.config)
            .field("has_source", &self.source.is_some())
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl UnifiedScoreService {
    /// Build a service over the given storage tiers.
    ///
    /// Fails with `InvalidConfig` if `config` does not validate.
    pub fn new(
        config: EngineConfig,
        persistence: Arc<dyn PersistenceAdapter>,
        cache: Arc<dyn CacheAdapter>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = config.rules();
        let policy = CheckInPolicy::from(&config);
        Ok(Self {
            persistence,
            cache,
            clock: Arc::new(SystemClock),
            source: None,
            config: Arc::new(config),
            registry: Arc::new(registry),
            policy,
            notifier: ScoreNotifier::new(),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_source(mut self, source: Arc<dyn WalletActivitySource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Replace the rule catalog.
    pub fn with_registry(mut self, registry: RulesRegistry) -> Result<Self> {
        registry.validate()?;
        self.registry = Arc::new(registry);
        Ok(self)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &RulesRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Load the state for `uid`: durable first, then cache, then a fresh
    /// zeroed state. A cached copy newer than the durable one wins. Never
    /// writes the durable store.
    pub async fn load_state(&self, uid: &PioneerId) -> Result<LoadedState> {
        require_uid(uid)?;
        match self.persistence.get(uid).await {
            Ok(Some(stored)) => {
                let (state, source) = self.reconcile(uid, stored).await;
                if source == StateSource::Durable {
                    self.cache.set(uid, &state).await;
                }
                Ok(LoadedState {
                    state,
                    is_new: false,
                    source,
                })
            }
            Ok(None) => Ok(self.load_secondary(uid).await),
            Err(e) => {
                log::warn!("durable read for {uid} failed, falling back to cache: {e}");
                Ok(self.load_secondary(uid).await)
            }
        }
    }

    pub async fn get_unified_score(&self, uid: &PioneerId) -> Result<UnifiedScore> {
        let loaded = self.load_state(uid).await?;
        Ok(self.compose(&loaded.state))
    }

    /// Whether `uid` may check in right now.
    pub async fn check_in_status(&self, uid: &PioneerId) -> Result<CheckInStatus> {
        let loaded = self.load_state(uid).await?;
        Ok(checkin::can_check_in(
            &loaded.state,
            &self.registry,
            &self.policy,
            self.clock.now_millis(),
        ))
    }

    /// Interaction and blockchain events merged, newest first.
    ///
    /// `limit` defaults to the configured history limit.
    pub async fn history(&self, uid: &PioneerId, limit: Option<usize>) -> Result<Vec<ScoreEvent>> {
        let loaded = self.load_state(uid).await?;
        let mut events: Vec<ScoreEvent> = loaded
            .state
            .interaction_history
            .into_iter()
            .chain(loaded.state.blockchain_events)
            .collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit.unwrap_or(self.config.history_limit));
        Ok(events)
    }

    // -----------------------------------------------------------------------
    // Engagement
    // -----------------------------------------------------------------------

    pub async fn check_in(&self, uid: &PioneerId) -> ActionResult {
        self.mutate(uid, ScoreAction::CheckIn, |state, now| {
            checkin::perform_check_in(state, &self.registry, &self.policy, now)
                .map(|award| Some((award.points_earned, ())))
                .map_err(FailureReason::from)
        })
        .await
        .0
    }

    pub async fn claim_ad_bonus(&self, uid: &PioneerId) -> ActionResult {
        self.mutate(uid, ScoreAction::AdBonus, |state, now| {
            checkin::claim_ad_bonus(state, &self.registry, &self.policy, now)
                .map(|award| Some((award.points_earned, ())))
                .map_err(FailureReason::from)
        })
        .await
        .0
    }

    /// Move pending check-in points into the durable reputation score.
    ///
    /// `amount` defaults to everything pending. Asking for more than is
    /// pending is refused with `InsufficientPoints`; merging nothing is a
    /// successful no-op.
    pub async fn merge_checkin_points(&self, uid: &PioneerId, amount: Option<u64>) -> ActionResult {
        self.mutate(uid, ScoreAction::Merge, |state, _now| {
            let available = state.daily_checkin_points;
            let requested = amount.unwrap_or(available);
            if requested > available {
                return Err(FailureReason::InsufficientPoints {
                    requested,
                    available,
                });
            }
            if requested == 0 {
                return Ok(None);
            }
            state.daily_checkin_points -= requested;
            state.merged_checkin_points = state.merged_checkin_points.saturating_add(requested);
            state.reputation_score = state.reputation_score.saturating_add(requested);
            let points = i64::try_from(requested).unwrap_or(i64::MAX);
            Ok(Some((points, ())))
        })
        .await
        .0
    }

    // -----------------------------------------------------------------------
    // Blockchain
    // -----------------------------------------------------------------------

    /// Recompute the wallet-derived score from a full activity snapshot.
    ///
    /// Replaces `blockchain_score` and appends one event per component that
    /// moved since the previous snapshot. `reputation_score` is untouched.
    pub async fn sync_blockchain_data(
        &self,
        uid: &PioneerId,
        wallet_address: Option<String>,
        activity: &WalletActivityData,
    ) -> SyncResult {
        let atomic = calculate(activity, &self.registry, &self.config.atomic_settings());
        let wallet_address = wallet_address.or_else(|| activity.wallet_address.clone());
        let history_limit = self.config.history_limit;

        let (result, appended) = self
            .mutate(uid, ScoreAction::BlockchainSync, |state, now| {
                let previous = state.blockchain_snapshot.clone().unwrap_or_default();
                if wallet_address.is_some() {
                    state.wallet_address = wallet_address.clone();
                }

                let mut appended = 0;
                for ((name, old), (_, new)) in
                    previous.components().into_iter().zip(atomic.components())
                {
                    if old == new {
                        continue;
                    }
                    let event = ScoreEvent::new(&state.uid, name, new - old, now)
                        .with_wallet(state.wallet_address.clone())
                        .with_metadata(json!({ "previous": old, "current": new }));
                    state.push_blockchain_event(event, history_limit);
                    appended += 1;
                }

                let delta = signed_delta(state.blockchain_score, atomic.adjusted_score);
                state.blockchain_score = atomic.adjusted_score;
                state.blockchain_snapshot = Some(atomic.clone());
                state.last_blockchain_sync = Some(now);
                Ok(Some((delta, appended)))
            })
            .await;

        let authoritative = result.success;
        SyncResult {
            result,
            atomic,
            authoritative,
            events_appended: appended.unwrap_or(0),
        }
    }

    /// Fetch activity for `wallet_address` and sync it.
    ///
    /// A failed or timed-out fetch leaves `blockchain_score` alone and comes
    /// back non-authoritative with `SourceUnavailable`.
    pub async fn scan_wallet(&self, uid: &PioneerId, wallet_address: &str) -> SyncResult {
        if uid.is_blank() {
            let result = self
                .refuse(uid, ScoreAction::BlockchainSync, FailureReason::MissingUid)
                .await;
            return SyncResult {
                result,
                atomic: AtomicReputationResult::default(),
                authoritative: false,
                events_appended: 0,
            };
        }

        let fetched = match &self.source {
            Some(source) => {
                fetch_with_timeout(
                    source.as_ref(),
                    wallet_address,
                    self.config.wallet_fetch_timeout_ms,
                )
                .await
            }
            None => {
                log::warn!("wallet scan for {uid} requested but no activity source is configured");
                FetchedActivity {
                    activity: WalletActivityData::default(),
                    authoritative: false,
                    failure: Some("no wallet activity source configured".to_string()),
                }
            }
        };

        if fetched.authoritative {
            return self
                .sync_blockchain_data(uid, Some(wallet_address.to_string()), &fetched.activity)
                .await;
        }

        let message = fetched
            .failure
            .unwrap_or_else(|| "wallet activity unavailable".to_string());
        let result = self
            .refuse(
                uid,
                ScoreAction::BlockchainSync,
                FailureReason::SourceUnavailable { message },
            )
            .await;
        SyncResult {
            result,
            atomic: AtomicReputationResult::default(),
            authoritative: false,
            events_appended: 0,
        }
    }

    /// Apply one discrete blockchain event to both the blockchain score and
    /// the durable ledger.
    ///
    /// Negative points are allowed and saturate at zero; they are the audited
    /// way for the ledger to shrink.
    pub async fn add_blockchain_event(&self, uid: &PioneerId, event: ScoreEvent) -> ActionResult {
        let history_limit = self.config.history_limit;
        let cap = self.config.levels.cap();
        self.mutate(uid, ScoreAction::BlockchainEvent, |state, _now| {
            let mut event = event.clone();
            event.uid = state.uid.clone();
            if event.wallet_address.is_none() {
                event.wallet_address = state.wallet_address.clone();
            }
            state.blockchain_score = state
                .blockchain_score
                .saturating_add_signed(event.points)
                .min(cap);
            state.reputation_score = state.reputation_score.saturating_add_signed(event.points);
            let points = event.points;
            state.push_blockchain_event(event, history_limit);
            Ok(Some((points, ())))
        })
        .await
        .0
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Set `reputation_score` to `new_score`, recording a `manual_correction`
    /// event with the signed difference and `note`.
    pub async fn correct_score(&self, uid: &PioneerId, new_score: u64, note: &str) -> ActionResult {
        let history_limit = self.config.history_limit;
        self.mutate(uid, ScoreAction::Correction, |state, now| {
            let previous = state.reputation_score;
            if previous == new_score {
                return Ok(None);
            }
            let delta = signed_delta(previous, new_score);
            state.reputation_score = new_score;
            let event = ScoreEvent::new(&state.uid, RuleId::MANUAL_CORRECTION, delta, now)
                .with_wallet(state.wallet_address.clone())
                .with_metadata(json!({ "note": note, "previous": previous, "current": new_score }));
            state.push_interaction(event, history_limit);
            log::info!("reputation for {} corrected {previous} -> {new_score}: {note}", state.uid);
            Ok(Some((delta, ())))
        })
        .await
        .0
    }

    /// Apply the client-editable part of a submitted state.
    ///
    /// Only `wallet_address` (when present) and `reputation_score` are taken
    /// from `incoming`. Check-in markers, point buckets, the blockchain
    /// snapshot, histories and the version stay as stored. A lower
    /// `reputation_score` is refused with `ScoreRegression`; a higher one is
    /// recorded as a `manual_correction` event.
    pub async fn save_state(&self, incoming: UserReputationState) -> ActionResult {
        let uid = incoming.uid.clone();
        let history_limit = self.config.history_limit;
        self.mutate(&uid, ScoreAction::Save, |state, now| {
            let previous = state.reputation_score;
            let proposed = incoming.reputation_score;
            if proposed < previous {
                return Err(FailureReason::ScoreRegression {
                    current: previous,
                    proposed,
                });
            }
            let wallet_changed = incoming.wallet_address.is_some()
                && incoming.wallet_address != state.wallet_address;
            if proposed == previous && !wallet_changed {
                return Ok(None);
            }
            if wallet_changed {
                state.wallet_address = incoming.wallet_address.clone();
            }
            let delta = signed_delta(previous, proposed);
            if delta != 0 {
                state.reputation_score = proposed;
                let event = ScoreEvent::new(&state.uid, RuleId::MANUAL_CORRECTION, delta, now)
                    .with_wallet(state.wallet_address.clone())
                    .with_metadata(json!({
                        "note": "saved state",
                        "previous": previous,
                        "current": proposed,
                    }));
                state.push_interaction(event, history_limit);
            }
            Ok(Some((delta, ())))
        })
        .await
        .0
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    /// Receive a [`ScoreUpdate`] after every successful mutation, optionally
    /// only for one pioneer.
    pub fn subscribe(&self, filter: Option<PioneerId>, callback: ScoreCallback) -> Subscription {
        self.notifier.subscribe(filter, callback)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn compose(&self, state: &UserReputationState) -> UnifiedScore {
        UnifiedScore::compose(state, &self.config.levels)
    }

    /// Pick the newer of the durable copy and the cached copy. A cached copy
    /// ahead of the durable one holds writes made during a durable outage.
    async fn reconcile(
        &self,
        uid: &PioneerId,
        stored: UserReputationState,
    ) -> (UserReputationState, StateSource) {
        match self.cache.get(uid).await {
            Some(cached) if cached.supersedes(&stored) => {
                log::debug!(
                    "cached state for {uid} is ahead of durable (version {} over {})",
                    cached.version,
                    stored.version
                );
                (cached, StateSource::Cache)
            }
            _ => (stored, StateSource::Durable),
        }
    }

    async fn load_secondary(&self, uid: &PioneerId) -> LoadedState {
        match self.cache.get(uid).await {
            Some(state) => LoadedState {
                state,
                is_new: false,
                source: StateSource::Cache,
            },
            None => LoadedState {
                state: UserReputationState::new(uid.clone(), self.clock.now_millis()),
                is_new: true,
                source: StateSource::Fresh,
            },
        }
    }

    /// A refused result carrying the current state.
    async fn refuse(&self, uid: &PioneerId, action: ScoreAction, reason: FailureReason) -> ActionResult {
        let state = match self.load_state(uid).await {
            Ok(loaded) => loaded.state,
            Err(_) => UserReputationState::new(uid.clone(), self.clock.now_millis()),
        };
        self.outcome(action, state, Persistence::NotWritten, 0, Some(reason))
    }

    fn outcome(
        &self,
        action: ScoreAction,
        state: UserReputationState,
        persistence: Persistence,
        points_earned: i64,
        reason: Option<FailureReason>,
    ) -> ActionResult {
        ActionResult {
            success: reason.is_none(),
            action,
            points_earned,
            reason,
            persistence,
            unified: self.compose(&state),
            state,
        }
    }

    fn publish(&self, action: ScoreAction, state: &UserReputationState) {
        self.notifier.publish(&ScoreUpdate {
            uid: state.uid.clone(),
            action,
            unified: self.compose(state),
        });
    }

    /// Read, transition, conditionally write; retry on version conflicts.
    async fn mutate<T, F>(
        &self,
        uid: &PioneerId,
        action: ScoreAction,
        mut transition: F,
    ) -> (ActionResult, Option<T>)
    where
        F: FnMut(&mut UserReputationState, u64) -> Transition<T>,
    {
        if uid.is_blank() {
            let state = UserReputationState::new(uid.clone(), self.clock.now_millis());
            let result =
                self.outcome(action, state, Persistence::NotWritten, 0, Some(FailureReason::MissingUid));
            return (result, None);
        }

        let attempts = self.config.max_write_attempts;
        let mut current = None;

        for attempt in 1..=attempts {
            let (base, expected_version) = match self.persistence.get(uid).await {
                Ok(Some(stored)) => {
                    // The durable version guards the write even when the
                    // cached copy is the base.
                    let version = Some(stored.version);
                    (self.reconcile(uid, stored).await.0, version)
                }
                Ok(None) => (self.load_secondary(uid).await.state, None),
                Err(e) => {
                    log::warn!("durable read for {uid} failed during {action}: {e}");
                    return self.mutate_tentative(uid, action, &mut transition).await;
                }
            };

            let now = self.clock.now_millis();
            let mut next = base.clone();
            let (points, detail) = match transition(&mut next, now) {
                Ok(Some(change)) => change,
                Ok(None) => {
                    let result = self.outcome(action, base, Persistence::NotWritten, 0, None);
                    return (result, None);
                }
                Err(reason) => {
                    log::debug!("{action} for {uid} refused: {reason}");
                    let result = self.outcome(action, base, Persistence::NotWritten, 0, Some(reason));
                    return (result, None);
                }
            };
            next.version = base.version.saturating_add(1);
            next.last_updated = now;

            match self
                .persistence
                .compare_and_set(uid, expected_version, &next)
                .await
            {
                Ok(WriteOutcome::Written) => {
                    self.cache.set(uid, &next).await;
                    log::info!(
                        "{action} for {uid}: {points:+} points (version {})",
                        next.version
                    );
                    self.publish(action, &next);
                    let result = self.outcome(action, next, Persistence::Durable, points, None);
                    return (result, Some(detail));
                }
                Ok(WriteOutcome::Conflict { current_version }) => {
                    log::debug!(
                        "{action} for {uid} lost a race on attempt {attempt}/{attempts} \
                         (expected {expected_version:?}, found {current_version:?})"
                    );
                    current = Some(base);
                }
                Err(e) => {
                    log::warn!("durable write for {uid} failed during {action}, caching: {e}");
                    self.cache.set(uid, &next).await;
                    self.publish(action, &next);
                    let result = self.outcome(action, next, Persistence::Tentative, points, None);
                    return (result, Some(detail));
                }
            }
        }

        log::warn!("{action} for {uid} gave up after {attempts} conflicting writes");
        let state = match current {
            Some(state) => state,
            None => self.load_secondary(uid).await.state,
        };
        let result = self.outcome(
            action,
            state,
            Persistence::NotWritten,
            0,
            Some(FailureReason::ConcurrentModification { attempts }),
        );
        (result, None)
    }

    /// Apply a transition against the cache tier only.
    async fn mutate_tentative<T, F>(
        &self,
        uid: &PioneerId,
        action: ScoreAction,
        transition: &mut F,
    ) -> (ActionResult, Option<T>)
    where
        F: FnMut(&mut UserReputationState, u64) -> Transition<T>,
    {
        let base = self.load_secondary(uid).await.state;
        let now = self.clock.now_millis();
        let mut next = base.clone();
        match transition(&mut next, now) {
            Ok(Some((points, detail))) => {
                next.version = base.version.saturating_add(1);
                next.last_updated = now;
                self.cache.set(uid, &next).await;
                self.publish(action, &next);
                let result = self.outcome(action, next, Persistence::Tentative, points, None);
                (result, Some(detail))
            }
            Ok(None) => (self.outcome(action, base, Persistence::NotWritten, 0, None), None),
            Err(reason) => (
                self.outcome(action, base, Persistence::NotWritten, 0, Some(reason)),
                None,
            ),
        }
    }
}

fn require_uid(uid: &PioneerId) -> Result<()> {
    if uid.is_blank() {
        return Err(ReputationError::InvalidInput("uid is required".to_string()));
    }
    Ok(())
}

fn signed_delta(from: u64, to: u64) -> i64 {
    let from = i64::try_from(from).unwrap_or(i64::MAX);
    let to = i64::try_from(to).unwrap_or(i64::MAX);
    to.saturating_sub(from)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
