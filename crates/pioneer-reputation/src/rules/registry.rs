//! Rules registry: the process-wide catalog of scoring rules.

use std::collections::BTreeMap;

use crate::error::{ReputationError, Result};

use super::types::*;

/// Default testnet scaling for network-category rules.
pub const DEFAULT_TESTNET_MULTIPLIER: f64 = 0.25;

/// Read-only catalog of scoring rules.
///
/// Lookups never fail: an unknown rule id resolves to zero points so callers
/// can treat absent rules as no-ops.
#[derive(Debug, Clone)]
pub struct RulesRegistry {
    rules: BTreeMap<RuleId, ScoringRule>,
    testnet_multiplier: f64,
}

impl Default for RulesRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl RulesRegistry {
    /// An empty registry with the given testnet multiplier.
    pub fn new(testnet_multiplier: f64) -> Self {
        Self {
            rules: BTreeMap::new(),
            testnet_multiplier,
        }
    }

    /// The standard pioneer catalog.
    pub fn standard() -> Self {
        Self::new(DEFAULT_TESTNET_MULTIPLIER)
            .with_rule(
                ScoringRule::new(RuleId::DAILY_CHECKIN, RuleCategory::Continuity, 3)
                    .describe("Daily check-in"),
            )
            .with_rule(
                ScoringRule::new(RuleId::STREAK_BONUS_7, RuleCategory::Continuity, 10)
                    .describe("Every 7th consecutive check-in"),
            )
            .with_rule(
                ScoringRule::new(RuleId::STREAK_BONUS_30, RuleCategory::Continuity, 50)
                    .describe("Every 30th consecutive check-in"),
            )
            .with_rule(
                ScoringRule::new(RuleId::AD_BONUS, RuleCategory::Activity, 2)
                    .describe("Ad watched after a check-in"),
            )
            .with_rule(
                ScoringRule::new(RuleId::REFERRAL, RuleCategory::Network, 10)
                    .max_points(500)
                    .describe("Referred pioneer joined"),
            )
            .with_rule(
                ScoringRule::new(RuleId::WALLET_AGE_WEEK, RuleCategory::Trust, 2)
                    .max_points(150)
                    .describe("Per full week of wallet age"),
            )
            .with_rule(
                ScoringRule::new(RuleId::INTERNAL_TRANSACTION, RuleCategory::Network, 2)
                    .max_points(400)
                    .describe("In-ecosystem transaction"),
            )
            .with_rule(
                ScoringRule::new(RuleId::APP_INTERACTION, RuleCategory::Network, 3)
                    .max_points(300)
                    .describe("Distinct app interaction"),
            )
            .with_rule(
                ScoringRule::new(RuleId::SDK_PAYMENT, RuleCategory::Network, 5)
                    .max_points(500)
                    .describe("Payment made through an app SDK"),
            )
            .with_rule(
                ScoringRule::new(RuleId::STAKING_DAY, RuleCategory::Trust, 1)
                    .max_points(365)
                    .describe("Per day of continuous staking"),
            )
            .with_rule(
                ScoringRule::new(RuleId::STAKING_AMOUNT, RuleCategory::Trust, 1)
                    .max_points(200)
                    .describe("Per 100 units staked"),
            )
            .with_rule(
                ScoringRule::new(RuleId::EXTERNAL_TRANSFER, RuleCategory::Penalty, -5)
                    .max_points(100)
                    .describe("Transfer out of the ecosystem beyond the free allowance"),
            )
            .with_rule(
                ScoringRule::new(RuleId::SPAM_ACTIVITY, RuleCategory::Penalty, -20)
                    .max_points(200)
                    .describe("Flagged spam"),
            )
            .with_rule(
                ScoringRule::new(RuleId::FARMING_INSTANCE, RuleCategory::Penalty, -30)
                    .max_points(300)
                    .describe("Reward farming pattern"),
            )
            .with_rule(
                ScoringRule::new(RuleId::SUSPICIOUS_LINK, RuleCategory::Penalty, -10)
                    .max_points(100)
                    .describe("Dust or link to a flagged wallet"),
            )
            .with_rule(
                ScoringRule::new(RuleId::MANUAL_CORRECTION, RuleCategory::Trust, 0)
                    .describe("Audited manual score correction"),
            )
    }

    /// Add or replace a rule.
    pub fn with_rule(mut self, rule: ScoringRule) -> Self {
        self.rules.insert(rule.id.clone(), rule);
        self
    }

    /// Replace the registry-wide testnet multiplier.
    pub fn with_testnet_multiplier(mut self, multiplier: f64) -> Self {
        self.testnet_multiplier = multiplier;
        self
    }

    /// Check the catalog for configuration bugs.
    ///
    /// Multipliers must be finite and within `[0, 1]`: testnet activity is
    /// never worth more than mainnet activity.
    pub fn validate(&self) -> Result<()> {
        check_multiplier("registry testnet multiplier", self.testnet_multiplier)?;
        for rule in self.rules.values() {
            if let Some(m) = rule.multiplier {
                check_multiplier(&format!("multiplier of rule '{}'", rule.id), m)?;
            }
            if rule.category == RuleCategory::Penalty && rule.base_points > 0 {
                return Err(ReputationError::InvalidConfig(format!(
                    "penalty rule '{}' has positive base points {}",
                    rule.id, rule.base_points
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, rule_id: &str) -> Option<&ScoringRule> {
        self.rules.get(&RuleId::new(rule_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoringRule> {
        self.rules.values()
    }

    pub fn testnet_multiplier(&self) -> f64 {
        self.testnet_multiplier
    }

    /// Cooldown declared by a rule, if any.
    pub fn cooldown_ms(&self, rule_id: &str) -> Option<u64> {
        self.get(rule_id).and_then(|r| r.cooldown_ms)
    }

    /// Points for a single mainnet application of a rule.
    pub fn points(&self, rule_id: &str) -> i64 {
        self.points_for(rule_id, 1, NetworkMode::Mainnet)
    }

    /// Resolve the points awarded by applying `rule_id` `count` times.
    ///
    /// `base_points * count`, magnitude clamped to `max_points` with the sign
    /// preserved, then scaled toward zero for testnet network activity.
    pub fn points_for(&self, rule_id: &str, count: u64, mode: NetworkMode) -> i64 {
        let Some(rule) = self.get(rule_id) else {
            return 0;
        };

        let count = i64::try_from(count).unwrap_or(i64::MAX);
        let mut points = rule.base_points.saturating_mul(count);

        if let Some(max) = rule.max_points {
            let max = i64::try_from(max).unwrap_or(i64::MAX);
            points = points.clamp(-max, max);
        }

        if rule.category == RuleCategory::Network && mode == NetworkMode::Testnet {
            let multiplier = rule.multiplier.unwrap_or(self.testnet_multiplier);
            points = (points as f64 * multiplier).trunc() as i64;
        }

        points
    }
}

fn check_multiplier(what: &str, m: f64) -> Result<()> {
    if !m.is_finite() || !(0.0..=1.0).contains(&m) {
        return Err(ReputationError::InvalidConfig(format!(
            "{what} must be within [0, 1], got {m}"
        )));
    }
    Ok(())
}
