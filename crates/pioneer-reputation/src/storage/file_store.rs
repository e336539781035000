//! Reputation state persistence: one JSON document per pioneer.
//!
//! Each state is stored in `{base_dir}/{key}.json`, where `key` is the first
//! 16 bytes of SHA-256(uid) in hex, so arbitrary uids never touch the path.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "state": { ... UserReputationState ... }
//! }
//! ```
//!
//! Writes go to a temporary file that is then renamed over the target.
//! Conditional writes are serialized through an async mutex, which makes the
//! store safe for concurrent use within one process; separate processes
//! sharing a directory are not coordinated.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::error::{ReputationError, Result};
use crate::state::{PioneerId, UserReputationState};

use super::{CacheAdapter, PersistenceAdapter, WriteOutcome};

// ── File format constants ─────────────────────────────────────────────────────

const STATE_FILE_VERSION: u32 = 1;

// ── On-disk structure ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    /// Format version number.
    version: u32,
    /// The stored state.
    state: UserReputationState,
}

// ── JsonFileStore ─────────────────────────────────────────────────────────────

/// Filesystem-backed store for `UserReputationState` documents.
pub struct JsonFileStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a new `JsonFileStore` rooted at `base_dir`.
    ///
    /// The directory and any missing parents are created if they do not exist.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// List the uids of every stored state.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<PioneerId>> {
        let mut uids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_state_file(&path).await {
                Ok(state) => uids.push(state.uid),
                Err(e) => log::warn!("skipping unreadable state file {}: {e}", path.display()),
            }
        }

        uids.sort();
        Ok(uids)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn state_path(&self, uid: &PioneerId) -> PathBuf {
        let hash = Sha256::digest(uid.0.as_bytes());
        self.base_dir
            .join(format!("{}.json", hex::encode(&hash[..16])))
    }

    async fn read(&self, uid: &PioneerId) -> Result<Option<UserReputationState>> {
        let path = self.state_path(uid);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        read_state_file(&path).await.map(Some)
    }

    async fn write(&self, uid: &PioneerId, state: &UserReputationState) -> Result<()> {
        let file = StateFile {
            version: STATE_FILE_VERSION,
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| ReputationError::SerializationError(e.to_string()))?;

        let path = self.state_path(uid);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

async fn read_state_file(path: &Path) -> Result<UserReputationState> {
    let bytes = tokio::fs::read(path).await?;
    let file: StateFile = serde_json::from_slice(&bytes).map_err(|e| {
        ReputationError::InvalidFileFormat(format!(
            "failed to parse state file {}: {e}",
            path.display()
        ))
    })?;
    if file.version != STATE_FILE_VERSION {
        return Err(ReputationError::InvalidFileFormat(format!(
            "unsupported state file version {} in {}",
            file.version,
            path.display()
        )));
    }
    Ok(file.state)
}

#[async_trait]
impl PersistenceAdapter for JsonFileStore {
    async fn get(&self, uid: &PioneerId) -> Result<Option<UserReputationState>> {
        self.read(uid).await
    }

    async fn set(&self, uid: &PioneerId, state: &UserReputationState) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(uid, state).await
    }

    async fn compare_and_set(
        &self,
        uid: &PioneerId,
        expected_version: Option<u64>,
        state: &UserReputationState,
    ) -> Result<WriteOutcome> {
        let _guard = self.write_lock.lock().await;
        let current_version = self.read(uid).await?.map(|s| s.version);
        if current_version != expected_version {
            return Ok(WriteOutcome::Conflict { current_version });
        }
        self.write(uid, state).await?;
        Ok(WriteOutcome::Written)
    }
}

#[async_trait]
impl CacheAdapter for JsonFileStore {
    async fn get(&self, uid: &PioneerId) -> Option<UserReputationState> {
        match self.read(uid).await {
            Ok(state) => state,
            Err(e) => {
                log::warn!("cache read for {uid} failed: {e}");
                None
            }
        }
    }

    async fn set(&self, uid: &PioneerId, state: &UserReputationState) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.write(uid, state).await {
            log::warn!("cache write for {uid} failed: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
