//! Stress test: long check-in runs through the full service.
//!
//! Validates streak bonuses over a year, streak resets at the continuity
//! boundary, and calendar days in a non-UTC offset.

use std::sync::Arc;

use pioneer_reputation::time::{MILLIS_PER_DAY, MILLIS_PER_HOUR};
use pioneer_reputation::{
    EngineConfig, FailureReason, ManualClock, MemoryStore, PioneerId, RuleId,
    UnifiedScoreService,
};

// 2024-03-10T12:00:00Z
const NOON: u64 = 1_710_072_000_000;

fn service_with(config: EngineConfig, clock: Arc<ManualClock>) -> UnifiedScoreService {
    let config = EngineConfig {
        history_limit: 1_000,
        ..config
    };
    UnifiedScoreService::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
    )
    .unwrap()
    .with_clock(clock)
}

#[tokio::test]
async fn stress_365_day_streak() {
    let clock = Arc::new(ManualClock::new(NOON));
    let service = service_with(EngineConfig::default(), clock.clone());
    let uid = PioneerId::from("devoted");

    let mut total = 0;
    for day in 1..=365u32 {
        let result = service.check_in(&uid).await;
        assert!(result.success, "day {day} should be open");
        assert_eq!(result.state.streak, day);

        let mut expected = 3;
        if day % 7 == 0 {
            expected += 10;
        }
        if day % 30 == 0 {
            expected += 50;
        }
        assert_eq!(result.points_earned, expected, "day {day}");
        total += expected;

        clock.advance(MILLIS_PER_DAY);
    }

    // 365 × 3 + 52 × 10 + 12 × 50
    assert_eq!(total, 2_215);
    let state = service.load_state(&uid).await.unwrap().state;
    assert_eq!(state.daily_checkin_points, 2_215);
    assert_eq!(state.longest_streak, 365);
    assert_eq!(state.total_checkin_days, 365);

    let bonus_7 = state
        .interaction_history
        .iter()
        .filter(|e| e.rule_id.as_str() == RuleId::STREAK_BONUS_7)
        .count();
    let bonus_30 = state
        .interaction_history
        .iter()
        .filter(|e| e.rule_id.as_str() == RuleId::STREAK_BONUS_30)
        .count();
    assert_eq!(bonus_7, 52);
    assert_eq!(bonus_30, 12);
}

#[tokio::test]
async fn stress_continuity_window_boundary() {
    let clock = Arc::new(ManualClock::new(NOON));
    let service = service_with(EngineConfig::default(), clock.clone());
    let uid = PioneerId::from("edge-walker");

    service.check_in(&uid).await;

    // Just inside the window: streak continues
    clock.advance(48 * MILLIS_PER_HOUR - 1);
    let inside = service.check_in(&uid).await;
    assert_eq!(inside.state.streak, 2);

    // Exactly at the window: streak resets
    clock.advance(48 * MILLIS_PER_HOUR);
    let at = service.check_in(&uid).await;
    assert_eq!(at.state.streak, 1);
    assert_eq!(at.state.longest_streak, 2);
}

#[tokio::test]
async fn stress_alternating_gaps_never_reach_bonus() {
    let clock = Arc::new(ManualClock::new(NOON));
    let service = service_with(EngineConfig::default(), clock.clone());
    let uid = PioneerId::from("sporadic");

    // Check in 6 days on, 2 days off, for ten cycles
    for _ in 0..10 {
        for _ in 0..6 {
            let result = service.check_in(&uid).await;
            assert_eq!(result.points_earned, 3);
            clock.advance(MILLIS_PER_DAY);
        }
        clock.advance(2 * MILLIS_PER_DAY);
    }

    let state = service.load_state(&uid).await.unwrap().state;
    assert_eq!(state.longest_streak, 6);
    assert_eq!(state.daily_checkin_points, 180);
}

#[tokio::test]
async fn stress_local_midnight_in_offset() {
    // UTC+05:30
    let config = EngineConfig {
        utc_offset_minutes: 330,
        ..EngineConfig::default()
    };
    // 2024-03-10T18:00Z is 23:30 local
    let late_evening = NOON + 6 * MILLIS_PER_HOUR;
    let clock = Arc::new(ManualClock::new(late_evening));
    let service = service_with(config, clock.clone());
    let uid = PioneerId::from("night-owl");

    assert!(service.check_in(&uid).await.success);
    let status = service.check_in_status(&uid).await.unwrap();
    assert!(!status.can_check_in);
    assert_eq!(status.remaining_ms, 30 * 60 * 1_000);
    assert_eq!(status.countdown, "00:30:00");
    assert_eq!(status.last_checkin_date.as_deref(), Some("2024-03-10"));

    // Thirty one minutes later it is a new local day
    clock.advance(31 * 60 * 1_000);
    let next = service.check_in(&uid).await;
    assert!(next.success);
    assert_eq!(next.state.streak, 2);

    let again = service.check_in(&uid).await;
    assert_eq!(again.reason, Some(FailureReason::AlreadyCheckedIn));
}
