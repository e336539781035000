//! Atomic calculator: turns a wallet activity snapshot into point buckets.

use crate::rules::{NetworkMode, RuleId, RulesRegistry};

use super::types::*;

/// Staked units per `staking_amount` point.
pub const STAKING_AMOUNT_UNIT: f64 = 100.0;

// ---------------------------------------------------------------------------
// Calculate
// ---------------------------------------------------------------------------

/// Compute the wallet-derived reputation for one activity snapshot.
///
/// Every component is capped on its own, penalties included, and the sum is
/// clamped to `[0, settings.cap]`. The function reads no persisted state: the
/// caller replaces the stored blockchain score with `adjusted_score` rather
/// than adding to it, so re-scanning the same history never inflates it.
pub fn calculate(
    activity: &WalletActivityData,
    registry: &RulesRegistry,
    settings: &AtomicSettings,
) -> AtomicReputationResult {
    let wallet_age_points = registry.points_for(
        RuleId::WALLET_AGE_WEEK,
        activity.account_age_days / 7,
        NetworkMode::Mainnet,
    );

    let network_activity_points = network_points(activity, registry);

    let staked_units = if activity.staked_amount.is_finite() && activity.staked_amount > 0.0 {
        (activity.staked_amount / STAKING_AMOUNT_UNIT).floor() as u64
    } else {
        0
    };
    let staking_points = registry
        .points_for(RuleId::STAKING_DAY, activity.staking_days, NetworkMode::Mainnet)
        .saturating_add(registry.points_for(
            RuleId::STAKING_AMOUNT,
            staked_units,
            NetworkMode::Mainnet,
        ));

    let billable_transfers = activity
        .external_transfer_count
        .saturating_sub(settings.external_transfer_allowance);
    let external_transfer_penalty = registry
        .points_for(RuleId::EXTERNAL_TRANSFER, billable_transfers, NetworkMode::Mainnet)
        .min(0);

    let suspicious_cap = i64::try_from(settings.suspicious_penalty_cap).unwrap_or(i64::MAX);
    let suspicious_activity_penalty = [
        (RuleId::SPAM_ACTIVITY, activity.spam_count),
        (RuleId::FARMING_INSTANCE, activity.farming_instances),
        (RuleId::SUSPICIOUS_LINK, activity.suspicious_link_count),
    ]
    .iter()
    .map(|(rule, count)| registry.points_for(rule, *count, NetworkMode::Mainnet))
    .fold(0i64, i64::saturating_add)
    .clamp(-suspicious_cap, 0);

    let raw_total = [
        wallet_age_points,
        network_activity_points,
        staking_points,
        external_transfer_penalty,
        suspicious_activity_penalty,
    ]
    .iter()
    .fold(0i64, |acc, p| acc.saturating_add(*p));

    let adjusted_score = (raw_total.max(0) as u64).min(settings.cap);

    log::debug!(
        "atomic score: age={} network={} staking={} external={} suspicious={} adjusted={}",
        wallet_age_points,
        network_activity_points,
        staking_points,
        external_transfer_penalty,
        suspicious_activity_penalty,
        adjusted_score
    );

    AtomicReputationResult {
        wallet_age_points,
        network_activity_points,
        staking_points,
        external_transfer_penalty,
        suspicious_activity_penalty,
        raw_total,
        adjusted_score,
    }
}

/// Mainnet counts at full weight plus testnet counts scaled down, each rule's
/// combined contribution held to that rule's own cap.
fn network_points(activity: &WalletActivityData, registry: &RulesRegistry) -> i64 {
    let rules = [
        (
            RuleId::INTERNAL_TRANSACTION,
            activity.mainnet.internal_tx_count,
            activity.testnet.internal_tx_count,
        ),
        (
            RuleId::APP_INTERACTION,
            activity.mainnet.app_interaction_count,
            activity.testnet.app_interaction_count,
        ),
        (
            RuleId::SDK_PAYMENT,
            activity.mainnet.sdk_payment_count,
            activity.testnet.sdk_payment_count,
        ),
    ];

    let mut total = 0i64;
    for (rule, mainnet, testnet) in rules {
        let combined = registry
            .points_for(rule, mainnet, NetworkMode::Mainnet)
            .saturating_add(registry.points_for(rule, testnet, NetworkMode::Testnet));
        let capped = match registry.get(rule).and_then(|r| r.max_points) {
            Some(max) => combined.min(i64::try_from(max).unwrap_or(i64::MAX)),
            None => combined,
        };
        total = total.saturating_add(capped);
    }

    total.saturating_add(registry.points_for(
        RuleId::REFERRAL,
        activity.referral_count,
        NetworkMode::Mainnet,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
