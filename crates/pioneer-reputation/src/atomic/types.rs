//! Data structures for wallet-derived ("atomic") reputation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Activity input
// ---------------------------------------------------------------------------

/// Per-network transaction counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkActivity {
    pub internal_tx_count: u64,
    pub app_interaction_count: u64,
    pub sdk_payment_count: u64,
}

/// Facts about a wallet, as reported by a wallet activity source.
///
/// Every field defaults to zero so a partial report from a flaky source still
/// deserializes; missing facts simply earn nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalletActivityData {
    pub wallet_address: Option<String>,
    pub account_age_days: u64,
    pub mainnet: NetworkActivity,
    pub testnet: NetworkActivity,
    pub referral_count: u64,
    pub staking_days: u64,
    pub staked_amount: f64,
    pub external_transfer_count: u64,
    pub spam_count: u64,
    pub farming_instances: u64,
    /// Dust transfers and links to flagged wallets.
    pub suspicious_link_count: u64,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Tunables for the atomic calculator that are not expressed as rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicSettings {
    /// Global score cap (the level table's cap).
    pub cap: u64,
    /// External transfers tolerated before the penalty starts.
    pub external_transfer_allowance: u64,
    /// Bound on the combined suspicious-activity penalty magnitude.
    pub suspicious_penalty_cap: u64,
}

impl Default for AtomicSettings {
    fn default() -> Self {
        Self {
            cap: 10_000,
            external_transfer_allowance: 3,
            suspicious_penalty_cap: 400,
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Named point buckets computed from one wallet activity snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomicReputationResult {
    pub wallet_age_points: i64,
    pub network_activity_points: i64,
    pub staking_points: i64,
    /// Zero or negative.
    pub external_transfer_penalty: i64,
    /// Zero or negative.
    pub suspicious_activity_penalty: i64,
    /// Unclamped sum of all components.
    pub raw_total: i64,
    /// `raw_total` clamped to `[0, cap]`.
    pub adjusted_score: u64,
}

impl AtomicReputationResult {
    pub const WALLET_AGE: &'static str = "atomic:wallet_age";
    pub const NETWORK_ACTIVITY: &'static str = "atomic:network_activity";
    pub const STAKING: &'static str = "atomic:staking";
    pub const EXTERNAL_TRANSFER: &'static str = "atomic:external_transfer_penalty";
    pub const SUSPICIOUS_ACTIVITY: &'static str = "atomic:suspicious_activity_penalty";

    /// Components tagged with a stable name, in a fixed order.
    pub fn components(&self) -> [(&'static str, i64); 5] {
        [
            (Self::WALLET_AGE, self.wallet_age_points),
            (Self::NETWORK_ACTIVITY, self.network_activity_points),
            (Self::STAKING, self.staking_points),
            (Self::EXTERNAL_TRANSFER, self.external_transfer_penalty),
            (Self::SUSPICIOUS_ACTIVITY, self.suspicious_activity_penalty),
        ]
    }
}
