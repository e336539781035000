//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle of one pioneer:
//! 1. First check-in on a fresh state
//! 2. A week-long streak earning the 7-day bonus
//! 3. Ad bonuses and a bounded merge
//! 4. Wallet sync and the unified score
//! 5. Persistence through the JSON file store

use std::sync::Arc;

use pioneer_reputation::time::{MILLIS_PER_DAY, MILLIS_PER_HOUR};
use pioneer_reputation::{
    EngineConfig, FailureReason, JsonFileStore, ManualClock, MemoryStore, NetworkActivity,
    Persistence, PioneerId, UnifiedScoreService, WalletActivityData,
};

// 2024-03-10T12:00:00Z
const NOON: u64 = 1_710_072_000_000;

fn memory_service(clock: Arc<ManualClock>) -> UnifiedScoreService {
    UnifiedScoreService::new(
        EngineConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
    )
    .expect("default configuration is valid")
    .with_clock(clock)
}

fn active_wallet(age_days: u64) -> WalletActivityData {
    WalletActivityData {
        wallet_address: Some("GPIONEER".to_string()),
        account_age_days: age_days,
        mainnet: NetworkActivity {
            internal_tx_count: 120,
            app_interaction_count: 15,
            sdk_payment_count: 4,
        },
        testnet: NetworkActivity {
            internal_tx_count: 40,
            ..NetworkActivity::default()
        },
        staking_days: 60,
        staked_amount: 800.0,
        ..WalletActivityData::default()
    }
}

// Scenario A: fresh pioneer checks in once.
#[tokio::test]
async fn scenario_a_fresh_check_in() {
    let clock = Arc::new(ManualClock::new(NOON));
    let service = memory_service(clock);
    let uid = PioneerId::from("fresh-pioneer");

    let result = service.check_in(&uid).await;
    assert!(result.success);
    assert_eq!(result.points_earned, 3);
    assert_eq!(result.state.streak, 1);
    assert_eq!(result.state.total_checkin_days, 1);
    assert_eq!(result.state.daily_checkin_points, 3);
}

// Scenario B: a pioneer on a 6-day streak checks in the next day.
#[tokio::test]
async fn scenario_b_seventh_day_bonus() {
    let clock = Arc::new(ManualClock::new(NOON));
    let service = memory_service(clock.clone());
    let uid = PioneerId::from("streaker");

    for _ in 0..6 {
        assert!(service.check_in(&uid).await.success);
        clock.advance(MILLIS_PER_DAY);
    }
    let before = service.load_state(&uid).await.unwrap().state;
    assert_eq!(before.streak, 6);

    let result = service.check_in(&uid).await;
    assert!(result.success);
    assert_eq!(result.points_earned, 13);
    assert_eq!(result.state.streak, 7);
    assert_eq!(
        result.state.daily_checkin_points,
        before.daily_checkin_points + 13
    );
}

// Scenario C: merging more than is pending fails and changes nothing.
#[tokio::test]
async fn scenario_c_merge_over_pending() {
    let clock = Arc::new(ManualClock::new(NOON));
    let service = memory_service(clock.clone());
    let uid = PioneerId::from("merger");

    // 3 + 2 + 3 + 2 + 3 = 13 pending
    for day in 0..3 {
        service.check_in(&uid).await;
        if day < 2 {
            service.claim_ad_bonus(&uid).await;
        }
        clock.advance(MILLIS_PER_DAY);
    }
    let before = service.load_state(&uid).await.unwrap().state;
    assert_eq!(before.daily_checkin_points, 13);

    let result = service.merge_checkin_points(&uid, Some(20)).await;
    assert!(!result.success);
    assert_eq!(
        result.reason,
        Some(FailureReason::InsufficientPoints {
            requested: 20,
            available: 13
        })
    );
    assert_eq!(result.state, before);
    assert_eq!(service.load_state(&uid).await.unwrap().state, before);
}

// Scenario D: an older wallet out-scores a younger one with the same activity.
#[tokio::test]
async fn scenario_d_wallet_age_matters() {
    let clock = Arc::new(ManualClock::new(NOON));
    let service = memory_service(clock);

    let young = service
        .sync_blockchain_data(&PioneerId::from("young"), None, &active_wallet(10))
        .await;
    let old = service
        .sync_blockchain_data(&PioneerId::from("old"), None, &active_wallet(400))
        .await;

    assert!(young.result.success && old.result.success);
    assert!(old.atomic.wallet_age_points > young.atomic.wallet_age_points);
    assert!(old.result.state.blockchain_score > young.result.state.blockchain_score);
    assert!(old.result.unified.total > young.result.unified.total);
}

#[tokio::test]
async fn full_workflow_check_in_to_merge_to_sync() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(NOON));
    let uid = PioneerId::from("pioneer-42");

    let open = |clock: Arc<ManualClock>| {
        UnifiedScoreService::new(
            EngineConfig::default(),
            Arc::new(JsonFileStore::new(dir.path().join("state")).unwrap()),
            Arc::new(JsonFileStore::new(dir.path().join("cache")).unwrap()),
        )
        .unwrap()
        .with_clock(clock)
    };

    // ── Step 1: First check-in ──────────────────────────────────────────
    let service = open(clock.clone());
    let first = service.check_in(&uid).await;
    assert!(first.success);
    assert_eq!(first.persistence, Persistence::Durable);

    // ── Step 2: A week of check-ins with ad bonuses ─────────────────────
    service.claim_ad_bonus(&uid).await;
    for _ in 1..7 {
        clock.advance(MILLIS_PER_DAY);
        assert!(service.check_in(&uid).await.success);
        assert!(service.claim_ad_bonus(&uid).await.success);
    }
    let week = service.load_state(&uid).await.unwrap().state;
    assert_eq!(week.streak, 7);
    // 7 × 3 base + 10 streak bonus + 7 × 2 ad
    assert_eq!(week.daily_checkin_points, 45);

    // ── Step 3: Merge part, then the rest ───────────────────────────────
    assert!(service.merge_checkin_points(&uid, Some(40)).await.success);
    let merged = service.merge_checkin_points(&uid, None).await;
    assert!(merged.success);
    assert_eq!(merged.state.reputation_score, 45);
    assert_eq!(merged.state.daily_checkin_points, 0);
    assert_eq!(merged.unified.total, 45);

    // ── Step 4: Wallet sync ─────────────────────────────────────────────
    let synced = service
        .sync_blockchain_data(&uid, None, &active_wallet(400))
        .await;
    assert!(synced.result.success);
    let blockchain = synced.result.state.blockchain_score;
    assert!(blockchain > 0);
    assert_eq!(synced.result.state.reputation_score, 45);
    assert_eq!(synced.result.unified.total, blockchain + 45);

    // ── Step 5: A fresh service over the same files sees everything ─────
    drop(service);
    clock.advance(3 * MILLIS_PER_DAY + MILLIS_PER_HOUR);
    let reopened = open(clock.clone());
    let loaded = reopened.load_state(&uid).await.unwrap();
    assert!(!loaded.is_new);
    assert_eq!(loaded.state.blockchain_score, blockchain);
    assert_eq!(loaded.state.longest_streak, 7);

    // The streak broke over the gap
    let after_gap = reopened.check_in(&uid).await;
    assert!(after_gap.success);
    assert_eq!(after_gap.state.streak, 1);
    assert_eq!(after_gap.state.longest_streak, 7);

    let history = reopened.history(&uid, Some(5)).await.unwrap();
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].rule_id.as_str(), "daily_checkin");
}
