//! Check-in engine: eligibility, streak continuity, and ad-bonus claims.
//!
//! Transitions mutate the state in place only when they succeed; a rejected
//! transition leaves it untouched.

use serde_json::json;

use crate::rules::{RuleId, RulesRegistry};
use crate::state::{CheckInId, ScoreEvent, UserReputationState};
use crate::time::{format_countdown, local_date, millis_until_next_day};

use super::types::*;

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// Decide whether `state` may check in at `now`.
///
/// Open when there is no previous check-in, or when the previous one fell on
/// an earlier local calendar day and the daily rule's cooldown (if any) has
/// elapsed.
pub fn can_check_in(
    state: &UserReputationState,
    registry: &RulesRegistry,
    policy: &CheckInPolicy,
    now: u64,
) -> CheckInStatus {
    let offset = policy.utc_offset_minutes;
    let last_checkin_date = state
        .last_checkin
        .map(|last| local_date(last, offset).to_string());

    let remaining_ms = match state.last_checkin {
        None => 0,
        // Clock went backwards: hold until the stored check-in's day is over.
        Some(last) if now < last => (last - now).saturating_add(millis_until_next_day(last, offset)),
        Some(last) => {
            let day_wait = if local_date(last, offset) == local_date(now, offset) {
                millis_until_next_day(now, offset)
            } else {
                0
            };
            let cooldown = registry.cooldown_ms(RuleId::DAILY_CHECKIN).unwrap_or(0);
            let cooldown_wait = last.saturating_add(cooldown).saturating_sub(now);
            day_wait.max(cooldown_wait)
        }
    };

    CheckInStatus {
        can_check_in: remaining_ms == 0,
        remaining_ms,
        countdown: format_countdown(remaining_ms),
        last_checkin_date,
        current_streak: state.streak,
        ad_bonus_available: state.last_checkin_id.is_some() && !state.ad_bonus_claimed(),
    }
}

// ---------------------------------------------------------------------------
// Streak bonus
// ---------------------------------------------------------------------------

/// Bonus points earned on reaching `streak` consecutive check-ins.
///
/// The 7-day bonus fires on every multiple of 7, the 30-day bonus on every
/// multiple of 30; both fire when a streak hits a multiple of each.
pub fn streak_bonus(registry: &RulesRegistry, streak: u32) -> i64 {
    fired_bonus_rules(streak)
        .into_iter()
        .map(|rule| registry.points(rule))
        .sum()
}

fn fired_bonus_rules(streak: u32) -> Vec<&'static str> {
    let mut rules = Vec::new();
    if streak >= 7 && streak % 7 == 0 {
        rules.push(RuleId::STREAK_BONUS_7);
    }
    if streak >= 30 && streak % 30 == 0 {
        rules.push(RuleId::STREAK_BONUS_30);
    }
    rules
}

// ---------------------------------------------------------------------------
// Perform check-in
// ---------------------------------------------------------------------------

/// Check in at `now`, awarding the daily points plus any streak bonus.
///
/// Rejected with [`CheckInRejection::AlreadyCheckedIn`] when not eligible, so
/// a repeat on the same day never awards twice.
pub fn perform_check_in(
    state: &mut UserReputationState,
    registry: &RulesRegistry,
    policy: &CheckInPolicy,
    now: u64,
) -> Result<CheckInAward, CheckInRejection> {
    if !can_check_in(state, registry, policy, now).can_check_in {
        return Err(CheckInRejection::AlreadyCheckedIn);
    }

    let streak_continued = matches!(
        state.last_checkin,
        Some(last) if now.saturating_sub(last) < policy.continuity_window_ms
    );
    let streak = if streak_continued {
        state.streak.saturating_add(1)
    } else {
        1
    };

    let base_points = registry.points(RuleId::DAILY_CHECKIN);
    let bonus_rules = fired_bonus_rules(streak);
    let streak_bonus: i64 = bonus_rules.iter().map(|r| registry.points(r)).sum();
    let points_earned = base_points.saturating_add(streak_bonus);

    state.total_checkin_days = state.total_checkin_days.saturating_add(1);
    let checkin_id = CheckInId::derive(&state.uid, now, state.total_checkin_days);

    state.daily_checkin_points = state.daily_checkin_points.saturating_add_signed(points_earned);
    state.last_checkin = Some(now);
    state.last_checkin_id = Some(checkin_id.clone());
    state.streak = streak;
    state.longest_streak = state.longest_streak.max(streak);

    let metadata = json!({ "checkInId": checkin_id.0, "streak": streak });
    let base_event = ScoreEvent::new(&state.uid, RuleId::DAILY_CHECKIN, base_points, now)
        .with_wallet(state.wallet_address.clone())
        .with_metadata(metadata.clone());
    state.push_interaction(base_event, policy.history_limit);
    for rule in bonus_rules {
        let event = ScoreEvent::new(&state.uid, rule, registry.points(rule), now)
            .with_wallet(state.wallet_address.clone())
            .with_metadata(metadata.clone());
        state.push_interaction(event, policy.history_limit);
    }

    log::debug!(
        "check-in {} for {}: streak={} earned={} (base {}, bonus {})",
        checkin_id,
        state.uid,
        streak,
        points_earned,
        base_points,
        streak_bonus
    );

    Ok(CheckInAward {
        checkin_id,
        base_points,
        streak_bonus,
        points_earned,
        streak,
        streak_continued,
    })
}

// ---------------------------------------------------------------------------
// Ad bonus
// ---------------------------------------------------------------------------

/// Claim the ad bonus for the current check-in.
///
/// Allowed once per check-in id. Without any check-in on record there is
/// nothing to claim against and the claim is rejected the same way.
pub fn claim_ad_bonus(
    state: &mut UserReputationState,
    registry: &RulesRegistry,
    policy: &CheckInPolicy,
    now: u64,
) -> Result<AdBonusAward, CheckInRejection> {
    let Some(checkin_id) = state.last_checkin_id.clone() else {
        return Err(CheckInRejection::AlreadyClaimed);
    };
    if state.ad_claimed_for_checkin.as_ref() == Some(&checkin_id) {
        return Err(CheckInRejection::AlreadyClaimed);
    }

    let points_earned = registry.points(RuleId::AD_BONUS);
    state.daily_checkin_points = state.daily_checkin_points.saturating_add_signed(points_earned);
    state.ad_claimed_for_checkin = Some(checkin_id.clone());
    state.last_ad_watch = Some(now);

    let event = ScoreEvent::new(&state.uid, RuleId::AD_BONUS, points_earned, now)
        .with_wallet(state.wallet_address.clone())
        .with_metadata(json!({ "checkInId": checkin_id.0 }));
    state.push_interaction(event, policy.history_limit);

    log::debug!("ad bonus for {} on {}: +{}", state.uid, checkin_id, points_earned);

    Ok(AdBonusAward {
        checkin_id,
        points_earned,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
