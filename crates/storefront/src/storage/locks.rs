//! Per-key update locks.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Locks are dropped from the table after this long without use.
const LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// One async mutex per storage key, created on first use.
///
/// Holding the guard returned by [`KeyLocks::lock`] serializes
/// read-modify-write sequences on that key across tasks. Idle locks expire
/// so the table does not grow with every visitor ever seen.
#[derive(Clone)]
pub struct KeyLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder().time_to_idle(LOCK_IDLE_TIMEOUT).build(),
        }
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .get_with(key.to_string(), async { Arc::new(Mutex::new(())) })
            .await;
        mutex.lock_owned().await
    }
}
