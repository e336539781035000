//! Edge case tests: scoring arithmetic at its limits.
//!
//! Covers saturating counts, cap enforcement, testnet truncation, level
//! monotonicity across the whole range, and configuration rejected at
//! construction.

use std::sync::Arc;

use pioneer_reputation::atomic::calculate;
use pioneer_reputation::{
    AtomicSettings, EngineConfig, LevelTable, LevelThreshold, ManualClock, MemoryStore,
    NetworkActivity, NetworkMode, PioneerId, ReputationError, RuleCategory, RuleId,
    RulesRegistry, ScoreEvent, ScoringRule, UnifiedScoreService, WalletActivityData,
};

// 2024-03-10T12:00:00Z
const NOON: u64 = 1_710_072_000_000;

fn service() -> UnifiedScoreService {
    UnifiedScoreService::new(
        EngineConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
    )
    .unwrap()
    .with_clock(Arc::new(ManualClock::new(NOON)))
}

#[test]
fn edge_unknown_rule_scores_zero() {
    let registry = RulesRegistry::standard();
    assert_eq!(registry.points_for("no_such_rule", 1_000, NetworkMode::Mainnet), 0);
    assert_eq!(registry.points("no_such_rule"), 0);
}

#[test]
fn edge_huge_counts_saturate_then_cap() {
    let registry = RulesRegistry::standard();
    assert_eq!(
        registry.points_for(RuleId::SDK_PAYMENT, u64::MAX, NetworkMode::Mainnet),
        500
    );
    assert_eq!(
        registry.points_for(RuleId::FARMING_INSTANCE, u64::MAX, NetworkMode::Mainnet),
        -300
    );
}

#[test]
fn edge_testnet_scaling_truncates() {
    let registry = RulesRegistry::standard();
    // app_interaction base 3: floor(3 × 0.25) = 0, floor(9 × 0.25) = 2
    assert_eq!(
        registry.points_for(RuleId::APP_INTERACTION, 1, NetworkMode::Testnet),
        0
    );
    assert_eq!(
        registry.points_for(RuleId::APP_INTERACTION, 3, NetworkMode::Testnet),
        2
    );
    // Non-network rules ignore the mode
    assert_eq!(
        registry.points_for(RuleId::STAKING_DAY, 10, NetworkMode::Testnet),
        10
    );
}

#[test]
fn edge_rule_override_multiplier() {
    let registry = RulesRegistry::standard().with_rule(
        ScoringRule::new(RuleId::REFERRAL, RuleCategory::Network, 10)
            .max_points(500)
            .multiplier(0.5),
    );
    registry.validate().unwrap();
    assert_eq!(
        registry.points_for(RuleId::REFERRAL, 3, NetworkMode::Testnet),
        15
    );
}

#[test]
fn edge_positive_penalty_rejected() {
    let registry = RulesRegistry::standard()
        .with_rule(ScoringRule::new(RuleId::SPAM_ACTIVITY, RuleCategory::Penalty, 20));
    assert!(matches!(
        registry.validate(),
        Err(ReputationError::InvalidConfig(_))
    ));
}

#[test]
fn edge_maximal_wallet_hits_cap_exactly() {
    let maxed = NetworkActivity {
        internal_tx_count: u64::MAX,
        app_interaction_count: u64::MAX,
        sdk_payment_count: u64::MAX,
    };
    let activity = WalletActivityData {
        account_age_days: u64::MAX,
        mainnet: maxed.clone(),
        testnet: maxed,
        referral_count: u64::MAX,
        staking_days: u64::MAX,
        staked_amount: f64::MAX,
        ..WalletActivityData::default()
    };
    let settings = AtomicSettings {
        cap: 1_000,
        ..AtomicSettings::default()
    };
    let result = calculate(&activity, &RulesRegistry::standard(), &settings);
    assert!(result.raw_total > 1_000);
    assert_eq!(result.adjusted_score, 1_000);
}

#[test]
fn edge_worst_wallet_floors_at_zero() {
    let activity = WalletActivityData {
        external_transfer_count: u64::MAX,
        spam_count: u64::MAX,
        farming_instances: u64::MAX,
        suspicious_link_count: u64::MAX,
        ..WalletActivityData::default()
    };
    let result = calculate(
        &activity,
        &RulesRegistry::standard(),
        &AtomicSettings::default(),
    );
    assert_eq!(result.external_transfer_penalty, -100);
    assert_eq!(result.suspicious_activity_penalty, -400);
    assert_eq!(result.adjusted_score, 0);
}

#[test]
fn edge_levels_monotonic_over_full_range() {
    let table = LevelTable::standard();
    let mut previous = table.level_for(-1_000);
    assert_eq!(previous.level, 1);
    assert_eq!(previous.score, 0);

    for score in (0..=10_500i64).step_by(7) {
        let info = table.level_for(score);
        assert!(info.level >= previous.level, "level dropped at {score}");
        assert!(info.progress_percent <= 100);
        if info.level == previous.level && info.level < 7 {
            assert!(info.progress_percent >= previous.progress_percent);
        }
        previous = info;
    }

    let top = table.level_for(i64::MAX);
    assert_eq!(top.level, 7);
    assert_eq!(top.score, 10_000);
    assert_eq!(top.points_to_next, 0);
}

#[test]
fn edge_level_table_gaps_and_overlaps_rejected() {
    let gap = vec![
        LevelThreshold::new(1, "A", 0, 100),
        LevelThreshold::new(2, "B", 150, 200),
    ];
    let overlap = vec![
        LevelThreshold::new(1, "A", 0, 100),
        LevelThreshold::new(2, "B", 90, 200),
    ];
    let offset = vec![LevelThreshold::new(1, "A", 10, 100)];
    for table in [gap, overlap, offset, Vec::new()] {
        assert!(matches!(
            LevelTable::new(table),
            Err(ReputationError::InvalidConfig(_))
        ));
    }
}

#[test]
fn edge_bad_config_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");
    std::fs::write(
        &path,
        r#"{"levels": [{"level": 1, "rank": "Only", "min_score": 5, "max_score": 10}]}"#,
    )
    .unwrap();

    let err = EngineConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, ReputationError::InvalidConfig(_)));
    assert!(err.to_string().contains("engine.json"));
}

#[tokio::test]
async fn edge_unified_total_capped() {
    let service = service();
    let uid = PioneerId::from("whale");

    let windfall = ScoreEvent::new(&uid, "external:airdrop", 50_000, NOON);
    let result = service.add_blockchain_event(&uid, windfall).await;
    assert!(result.success);
    assert_eq!(result.state.blockchain_score, 10_000);
    assert_eq!(result.state.reputation_score, 50_000);

    service.check_in(&uid).await;
    let unified = service.get_unified_score(&uid).await.unwrap();
    assert_eq!(unified.total, 10_000);
    assert_eq!(unified.level.rank, "Legend");
    assert_eq!(unified.level.progress_percent, 100);
}

#[tokio::test]
async fn edge_correction_to_same_score_is_noop() {
    let service = service();
    let uid = PioneerId::from("steady");
    let result = service.correct_score(&uid, 0, "nothing to fix").await;
    assert!(result.success);
    assert_eq!(result.points_earned, 0);
    assert!(result.state.interaction_history.is_empty());
}
