//! Wallet activity sources.
//!
//! A [`WalletActivitySource`] turns a wallet address into the activity facts
//! the atomic calculator consumes. Explorer access lives outside this crate;
//! the engine only sees this trait and bounds every call with a timeout.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::atomic::WalletActivityData;
use crate::error::{ReputationError, Result};

/// Fetches wallet activity for an address.
#[async_trait]
pub trait WalletActivitySource: Send + Sync {
    async fn fetch(&self, wallet_address: &str) -> Result<WalletActivityData>;
}

/// Outcome of a bounded fetch.
///
/// When the source failed or timed out, `activity` is the default snapshot
/// and `authoritative` is false; callers must not fold it into a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedActivity {
    pub activity: WalletActivityData,
    pub authoritative: bool,
    pub failure: Option<String>,
}

/// Fetch through `source`, giving up after `timeout_ms`.
pub async fn fetch_with_timeout(
    source: &dyn WalletActivitySource,
    wallet_address: &str,
    timeout_ms: u64,
) -> FetchedActivity {
    let outcome = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        source.fetch(wallet_address),
    )
    .await
    .unwrap_or(Err(ReputationError::Timeout(timeout_ms)));

    match outcome {
        Ok(mut activity) => {
            if activity.wallet_address.is_none() {
                activity.wallet_address = Some(wallet_address.to_string());
            }
            FetchedActivity {
                activity,
                authoritative: true,
                failure: None,
            }
        }
        Err(e) => {
            log::warn!("wallet activity fetch for {wallet_address} failed: {e}");
            FetchedActivity {
                activity: WalletActivityData {
                    wallet_address: Some(wallet_address.to_string()),
                    ..WalletActivityData::default()
                },
                authoritative: false,
                failure: Some(e.to_string()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Static source
// ---------------------------------------------------------------------------

/// A source answering from a fixed address → activity table.
///
/// Unknown addresses fail with `SourceUnavailable`. Useful for fixtures and
/// for replaying explorer exports offline.
#[derive(Debug, Default)]
pub struct StaticActivitySource {
    wallets: RwLock<HashMap<String, WalletActivityData>>,
}

impl StaticActivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(self, wallet_address: &str, activity: WalletActivityData) -> Self {
        self.insert(wallet_address, activity);
        self
    }

    pub fn insert(&self, wallet_address: &str, activity: WalletActivityData) {
        if let Ok(mut wallets) = self.wallets.write() {
            wallets.insert(wallet_address.to_string(), activity);
        }
    }
}

#[async_trait]
impl WalletActivitySource for StaticActivitySource {
    async fn fetch(&self, wallet_address: &str) -> Result<WalletActivityData> {
        let wallets = self
            .wallets
            .read()
            .map_err(|_| ReputationError::SourceUnavailable("lock poisoned".to_string()))?;
        wallets.get(wallet_address).cloned().ok_or_else(|| {
            ReputationError::SourceUnavailable(format!("no activity for {wallet_address}"))
        })
    }
}
