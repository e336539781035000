//! Integration test: two-tier storage behaviour.
//!
//! Exercises the durable store going away and coming back, a cache that is
//! down at the same time, and wallet fetches that never answer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use pioneer_reputation::time::MILLIS_PER_DAY;
use pioneer_reputation::{
    EngineConfig, FailureReason, ManualClock, MemoryStore, Persistence, PioneerId,
    ReputationError, StateSource, UnifiedScoreService, WalletActivityData, WalletActivitySource,
};

// 2024-03-10T12:00:00Z
const NOON: u64 = 1_710_072_000_000;

struct Tiers {
    durable: Arc<MemoryStore>,
    cache: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    service: UnifiedScoreService,
}

fn tiers(config: EngineConfig) -> Tiers {
    let durable = Arc::new(MemoryStore::new());
    let cache = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(NOON));
    let service = UnifiedScoreService::new(config, durable.clone(), cache.clone())
        .unwrap()
        .with_clock(clock.clone());
    Tiers {
        durable,
        cache,
        clock,
        service,
    }
}

struct HangingSource;

#[async_trait]
impl WalletActivitySource for HangingSource {
    async fn fetch(&self, _wallet_address: &str) -> Result<WalletActivityData, ReputationError> {
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        Ok(WalletActivityData::default())
    }
}

struct BrokenSource;

#[async_trait]
impl WalletActivitySource for BrokenSource {
    async fn fetch(&self, wallet_address: &str) -> Result<WalletActivityData, ReputationError> {
        Err(ReputationError::SourceUnavailable(format!(
            "explorer returned 503 for {wallet_address}"
        )))
    }
}

#[tokio::test]
async fn outage_writes_land_in_cache_and_are_flagged() {
    let t = tiers(EngineConfig::default());
    let uid = PioneerId::from("p1");

    t.durable.set_available(false);
    let result = t.service.check_in(&uid).await;
    assert!(result.success);
    assert_eq!(result.persistence, Persistence::Tentative);
    assert!(t.durable.is_empty());
    assert_eq!(t.cache.peek(&uid).unwrap().daily_checkin_points, 3);

    // The cache keeps the check-in idempotent during the outage
    let repeat = t.service.check_in(&uid).await;
    assert_eq!(repeat.reason, Some(FailureReason::AlreadyCheckedIn));

    let loaded = t.service.load_state(&uid).await.unwrap();
    assert_eq!(loaded.source, StateSource::Cache);
}

#[tokio::test]
async fn recovery_promotes_cached_state_for_new_uid() {
    let t = tiers(EngineConfig::default());
    let uid = PioneerId::from("p1");

    t.durable.set_available(false);
    t.service.check_in(&uid).await;
    t.durable.set_available(true);

    // Durable has nothing yet, so the cached state is the starting point
    t.clock.advance(MILLIS_PER_DAY);
    let result = t.service.check_in(&uid).await;
    assert!(result.success);
    assert_eq!(result.persistence, Persistence::Durable);
    assert_eq!(result.state.streak, 2);
    assert_eq!(t.durable.peek(&uid).unwrap().daily_checkin_points, 6);
}

#[tokio::test]
async fn recovery_keeps_outage_writes_for_known_uid() {
    let t = tiers(EngineConfig::default());
    let uid = PioneerId::from("p1");

    let first = t.service.check_in(&uid).await;
    assert_eq!(first.persistence, Persistence::Durable);

    t.clock.advance(MILLIS_PER_DAY);
    t.durable.set_available(false);
    let outage = t.service.check_in(&uid).await;
    assert_eq!(outage.persistence, Persistence::Tentative);
    t.durable.set_available(true);

    // Same day, one second later: the cached check-in still counts
    t.clock.advance(1_000);
    let repeat = t.service.check_in(&uid).await;
    assert_eq!(repeat.reason, Some(FailureReason::AlreadyCheckedIn));
    assert_eq!(repeat.state.daily_checkin_points, 6);
    assert_eq!(t.durable.peek(&uid).unwrap().daily_checkin_points, 3);

    let loaded = t.service.load_state(&uid).await.unwrap();
    assert_eq!(loaded.source, StateSource::Cache);
    assert_eq!(loaded.state.streak, 2);
    assert_eq!(t.cache.peek(&uid).unwrap().version, 2);

    // The next write lands on top of the cached state
    t.clock.advance(MILLIS_PER_DAY);
    let next = t.service.check_in(&uid).await;
    assert!(next.success);
    assert_eq!(next.persistence, Persistence::Durable);
    assert_eq!(next.state.streak, 3);
    let stored = t.durable.peek(&uid).unwrap();
    assert_eq!(stored.daily_checkin_points, 9);
    assert_eq!(stored.total_checkin_days, 3);
    assert_eq!(stored.version, 3);

    let loaded = t.service.load_state(&uid).await.unwrap();
    assert_eq!(loaded.source, StateSource::Durable);
}

#[tokio::test]
async fn both_tiers_down_still_answers() {
    let t = tiers(EngineConfig::default());
    let uid = PioneerId::from("p1");

    t.durable.set_available(false);
    t.cache.set_available(false);

    let loaded = t.service.load_state(&uid).await.unwrap();
    assert!(loaded.is_new);
    assert_eq!(loaded.source, StateSource::Fresh);

    let result = t.service.check_in(&uid).await;
    assert!(result.success);
    assert_eq!(result.persistence, Persistence::Tentative);

    let score = t.service.get_unified_score(&uid).await.unwrap();
    assert_eq!(score.total, 0);
}

#[tokio::test]
async fn hanging_wallet_source_times_out() {
    let config = EngineConfig {
        wallet_fetch_timeout_ms: 100,
        ..EngineConfig::default()
    };
    let t = tiers(config);
    let service = t.service.with_source(Arc::new(HangingSource));
    let uid = PioneerId::from("p1");

    let scan = service.scan_wallet(&uid, "GHANG").await;
    assert!(!scan.authoritative);
    assert!(!scan.result.success);
    assert_eq!(
        scan.result.reason,
        Some(FailureReason::SourceUnavailable {
            message: "Timed out after 100 ms".to_string()
        })
    );
    assert_eq!(scan.result.state.blockchain_score, 0);
    assert!(t.durable.is_empty());
}

#[tokio::test]
async fn broken_wallet_source_keeps_previous_score() {
    let t = tiers(EngineConfig::default());
    let uid = PioneerId::from("p1");
    let activity = WalletActivityData {
        account_age_days: 700,
        ..WalletActivityData::default()
    };
    let synced = t.service.sync_blockchain_data(&uid, None, &activity).await;
    assert_eq!(synced.result.state.blockchain_score, 150);

    let service = t.service.with_source(Arc::new(BrokenSource));
    let scan = service.scan_wallet(&uid, "GBROKEN").await;
    assert!(!scan.authoritative);
    assert_eq!(scan.result.state.blockchain_score, 150);
    assert_eq!(t.durable.peek(&uid).unwrap().blockchain_score, 150);
}
