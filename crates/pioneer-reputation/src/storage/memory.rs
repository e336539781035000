//! In-process state store.
//!
//! Implements both storage tiers over a mutex-guarded map. The store can be
//! switched offline, in which case every durable operation fails with
//! `StorageError` and cache operations become no-ops, mimicking an
//! unreachable database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ReputationError, Result};
use crate::state::{PioneerId, UserReputationState};

use super::{CacheAdapter, PersistenceAdapter, WriteOutcome};

/// Map-backed store for tests, tools, and the local cache tier.
#[derive(Debug)]
pub struct MemoryStore {
    states: Mutex<HashMap<PioneerId, UserReputationState>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Take the store on- or offline.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Read a state directly, ignoring availability.
    pub fn peek(&self, uid: &PioneerId) -> Option<UserReputationState> {
        self.states.lock().ok()?.get(uid).cloned()
    }

    pub fn len(&self) -> usize {
        self.states.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(ReputationError::StorageError("memory store offline".to_string()))
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<PioneerId, UserReputationState>>> {
        self.states
            .lock()
            .map_err(|_| ReputationError::StorageError("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryStore {
    async fn get(&self, uid: &PioneerId) -> Result<Option<UserReputationState>> {
        self.ensure_available()?;
        Ok(self.lock()?.get(uid).cloned())
    }

    async fn set(&self, uid: &PioneerId, state: &UserReputationState) -> Result<()> {
        self.ensure_available()?;
        self.lock()?.insert(uid.clone(), state.clone());
        Ok(())
    }

    async fn compare_and_set(
        &self,
        uid: &PioneerId,
        expected_version: Option<u64>,
        state: &UserReputationState,
    ) -> Result<WriteOutcome> {
        self.ensure_available()?;
        let mut states = self.lock()?;
        let current_version = states.get(uid).map(|s| s.version);
        if current_version != expected_version {
            return Ok(WriteOutcome::Conflict { current_version });
        }
        states.insert(uid.clone(), state.clone());
        Ok(WriteOutcome::Written)
    }
}

#[async_trait]
impl CacheAdapter for MemoryStore {
    async fn get(&self, uid: &PioneerId) -> Option<UserReputationState> {
        if !self.is_available() {
            return None;
        }
        self.peek(uid)
    }

    async fn set(&self, uid: &PioneerId, state: &UserReputationState) {
        if !self.is_available() {
            return;
        }
        if let Ok(mut states) = self.states.lock() {
            states.insert(uid.clone(), state.clone());
        }
    }
}
