//! Data structures for scoring rules.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Rule id
// ---------------------------------------------------------------------------

/// A scoring rule identifier (e.g., "daily_checkin", "sdk_payment").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl RuleId {
    pub const DAILY_CHECKIN: &'static str = "daily_checkin";
    pub const STREAK_BONUS_7: &'static str = "streak_bonus_7";
    pub const STREAK_BONUS_30: &'static str = "streak_bonus_30";
    pub const AD_BONUS: &'static str = "ad_bonus";
    pub const REFERRAL: &'static str = "referral";
    pub const WALLET_AGE_WEEK: &'static str = "wallet_age_week";
    pub const INTERNAL_TRANSACTION: &'static str = "internal_transaction";
    pub const APP_INTERACTION: &'static str = "app_interaction";
    pub const SDK_PAYMENT: &'static str = "sdk_payment";
    pub const STAKING_DAY: &'static str = "staking_day";
    pub const STAKING_AMOUNT: &'static str = "staking_amount";
    pub const EXTERNAL_TRANSFER: &'static str = "external_transfer";
    pub const SPAM_ACTIVITY: &'static str = "spam_activity";
    pub const FARMING_INSTANCE: &'static str = "farming_instance";
    pub const SUSPICIOUS_LINK: &'static str = "suspicious_link";
    pub const MANUAL_CORRECTION: &'static str = "manual_correction";

    /// Create a new rule id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Category and network mode
// ---------------------------------------------------------------------------

/// What a rule rewards (or punishes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Activity,
    Continuity,
    Trust,
    Network,
    Penalty,
}

impl RuleCategory {
    pub fn as_tag(&self) -> &'static str {
        match self {
            RuleCategory::Activity => "activity",
            RuleCategory::Continuity => "continuity",
            RuleCategory::Trust => "trust",
            RuleCategory::Network => "network",
            RuleCategory::Penalty => "penalty",
        }
    }
}

/// Which network an activity is attributed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    #[default]
    Mainnet,
    Testnet,
}

// ---------------------------------------------------------------------------
// Scoring rule
// ---------------------------------------------------------------------------

/// An immutable scoring rule.
///
/// `max_points` bounds the absolute magnitude of what repeated application
/// of the rule can award, so a penalty rule with `base_points = -5` and
/// `max_points = 100` never subtracts more than 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRule {
    pub id: RuleId,
    pub category: RuleCategory,
    pub base_points: i64,
    pub max_points: Option<u64>,
    pub cooldown_ms: Option<u64>,
    /// Testnet scaling for network rules. Falls back to the registry-wide
    /// multiplier when absent.
    pub multiplier: Option<f64>,
    pub description: String,
}

impl ScoringRule {
    pub fn new(id: &str, category: RuleCategory, base_points: i64) -> Self {
        Self {
            id: RuleId::new(id),
            category,
            base_points,
            max_points: None,
            cooldown_ms: None,
            multiplier: None,
            description: String::new(),
        }
    }

    pub fn max_points(mut self, max: u64) -> Self {
        self.max_points = Some(max);
        self
    }

    pub fn cooldown_ms(mut self, cooldown: u64) -> Self {
        self.cooldown_ms = Some(cooldown);
        self
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
