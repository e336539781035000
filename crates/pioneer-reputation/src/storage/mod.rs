//! Storage adapters for pioneer reputation state.
//!
//! The score service works against two tiers:
//!
//! - a durable [`PersistenceAdapter`], the source of truth, which must offer
//!   an atomic conditional write so racing requests for one uid cannot both
//!   win a read-modify-write;
//! - a best-effort [`CacheAdapter`] used when the durable tier is down. The
//!   cache is never authoritative: a state served from or written only to
//!   the cache is tentative until the next successful durable write.
//!
//! # Modules
//!
//! - [`memory`]: in-process map implementing both tiers.
//! - [`file_store`]: one versioned JSON file per uid.

pub mod file_store;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::{PioneerId, UserReputationState};

pub use file_store::JsonFileStore;
pub use memory::MemoryStore;

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The stored version did not match; nothing was written.
    Conflict { current_version: Option<u64> },
}

/// Durable, authoritative storage.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Fetch the state for `uid`, or `None` if never stored.
    async fn get(&self, uid: &PioneerId) -> Result<Option<UserReputationState>>;

    /// Unconditionally store `state` for `uid`.
    async fn set(&self, uid: &PioneerId, state: &UserReputationState) -> Result<()>;

    /// Store `state` only if the stored version equals `expected_version`
    /// (`None` meaning "nothing stored yet"). Check and write are atomic.
    async fn compare_and_set(
        &self,
        uid: &PioneerId,
        expected_version: Option<u64>,
        state: &UserReputationState,
    ) -> Result<WriteOutcome>;
}

/// Fast, best-effort storage. Failures are swallowed by implementations.
#[async_trait]
pub trait CacheAdapter: Send + Sync {
    async fn get(&self, uid: &PioneerId) -> Option<UserReputationState>;

    async fn set(&self, uid: &PioneerId, state: &UserReputationState);
}
