//! Per-link sync locks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Exclusive right to sync one link, released on drop.
#[derive(Debug)]
pub struct SyncGuard {
    _guard: OwnedMutexGuard<()>,
}

/// One async lock per tracked link.
///
/// The map itself sits behind a short-held blocking mutex; the per-link
/// locks are held across the whole sync, external calls included.
#[derive(Debug, Default)]
pub struct SyncLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SyncLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `link` is free and takes it.
    pub async fn acquire(&self, link: &str) -> SyncGuard {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(link.to_string()).or_default())
        };

        SyncGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Returns true if a sync currently holds `link`.
    pub fn is_locked(&self, link: &str) -> bool {
        self.locks
            .lock()
            .get(link)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Drops the lock entry of `link` unless someone holds or awaits it.
    pub fn forget(&self, link: &str) {
        let mut locks = self.locks.lock();
        if locks
            .get(link)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(link);
        }
    }

    /// Returns the number of links with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns true if no link has a lock entry.
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}
