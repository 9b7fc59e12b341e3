//! The sync engine: one tracked repository through one mirror run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use permahost_core::{Link, RepoRecord, SyncSuccess};
use permahost_store::{RepoStore, StoreError};
use tracing::{debug, info, warn};

use super::SyncLocks;
use crate::error::SyncError;
use crate::mirror::MirrorExecutor;

/// Behavior switches of the sync engine.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Release the previous pin once a sync replaced it with a new hash.
    pub unpin_replaced: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            unpin_replaced: true,
        }
    }
}

/// Drives tracked repositories through registration, sync and removal.
///
/// Syncs of the same link are strictly serialized; the record is rewritten
/// only once, after the mirror run completed, so readers see either the
/// previous record or the complete new one.
pub struct SyncEngine {
    store: Arc<RepoStore>,
    executor: Arc<dyn MirrorExecutor>,
    locks: Arc<SyncLocks>,
    options: SyncOptions,
}

impl SyncEngine {
    /// Creates a new sync engine.
    pub fn new(
        store: Arc<RepoStore>,
        executor: Arc<dyn MirrorExecutor>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            executor,
            locks: Arc::new(SyncLocks::new()),
            options,
        }
    }

    /// Returns the repository store.
    pub fn store(&self) -> &Arc<RepoStore> {
        &self.store
    }

    /// Returns true if a sync of `link` is in progress.
    pub fn is_syncing(&self, link: &str) -> bool {
        self.locks.is_locked(link)
    }

    /// Starts tracking `link` and runs its first sync.
    ///
    /// # Errors
    ///
    /// - `SyncError::AlreadyTracked` if the link is tracked; the existing
    ///   record is left untouched
    /// - `SyncError::NotFound` if the record was deleted before the first
    ///   sync finished
    pub async fn register(&self, link: &Link) -> Result<RepoRecord, SyncError> {
        let record = RepoRecord::new(link, Utc::now());
        self.store.insert(&record)?;

        info!("Registered {}", link);

        self.sync(link.as_str()).await
    }

    /// Mirrors `link` once and persists the outcome.
    ///
    /// A failed mirror is not an error: the returned record has `lastError`
    /// set and its content fields unchanged.
    ///
    /// # Errors
    ///
    /// - `SyncError::NotFound` if the link is not tracked, or stopped being
    ///   tracked while the mirror ran
    /// - `SyncError::Store` if the store fails
    pub async fn sync(&self, link: &str) -> Result<RepoRecord, SyncError> {
        let guard = self.locks.acquire(link).await;

        let previous = match self.store.get(link) {
            Ok(record) => record,
            Err(e) => {
                // Removed before this sync started: its lock entry may have
                // been forgotten already.
                drop(guard);
                if e.is_not_found() {
                    self.locks.forget(link);
                }
                return Err(e.into());
            },
        };
        debug!(
            "Syncing {} (current content hash: {:?})",
            link,
            previous.content_hash()
        );

        let start = Instant::now();
        let result = self.executor.mirror(link).await;
        histogram!("permahost_sync_duration_seconds").record(start.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => {
                let content_hash = outcome.content_hash.clone();
                let success = SyncSuccess {
                    content_hash: outcome.content_hash,
                    commit: outcome.commit,
                    name: outcome.name,
                    synced_at: Utc::now(),
                };

                let mut replaced = None;
                let updated = self.store.update(link, |record| {
                    replaced = record.record_success(success);
                });

                match updated {
                    Ok(record) => {
                        counter!("permahost_sync_total", "outcome" => "success").increment(1);
                        info!("Synced {} at {}", link, content_hash);

                        if self.options.unpin_replaced
                            && let Some(old) = replaced
                        {
                            self.release(&old).await;
                        }

                        Ok(record)
                    },
                    Err(StoreError::NotFound(_)) => {
                        // Deleted mid-sync: nothing references the new pin.
                        warn!("{} was removed while syncing, releasing {}", link, content_hash);
                        self.release(&content_hash).await;
                        Err(SyncError::NotFound(link.to_string()))
                    },
                    Err(e) => Err(e.into()),
                }
            },
            Err(e) => {
                counter!("permahost_sync_total", "outcome" => "failure").increment(1);
                let message = e.to_string();
                warn!("Sync of {} failed: {}", link, message);

                let record = self
                    .store
                    .update(link, |record| record.record_failure(message))?;
                Ok(record)
            },
        }
    }

    /// Stops tracking `link`.
    ///
    /// A pinned content hash is released on a best-effort basis. The working
    /// area is removed in the background once no sync holds the link.
    pub async fn remove(&self, link: &str) -> Result<RepoRecord, SyncError> {
        let record = self.store.delete(link)?;
        info!("Removed {}", link);

        if record.pinned() {
            self.release(record.content_hash()).await;
        }

        let locks = Arc::clone(&self.locks);
        let store = Arc::clone(&self.store);
        let executor = Arc::clone(&self.executor);
        let link = link.to_string();

        tokio::spawn(async move {
            let guard = locks.acquire(&link).await;

            // Tracked again since: the working area belongs to the new record.
            match store.contains(&link) {
                Ok(false) => {
                    if let Err(e) = executor.discard(&link).await {
                        warn!("Could not discard working area of {}: {}", link, e);
                    }
                },
                Ok(true) => debug!("{} was registered again, keeping its working area", link),
                Err(e) => warn!("Could not check {} before discarding: {}", link, e),
            }

            drop(guard);
            locks.forget(&link);
        });

        Ok(record)
    }

    /// Releases a pin, logging failures.
    async fn release(&self, content_hash: &str) {
        match self.executor.unpin(content_hash).await {
            Ok(()) => debug!("Unpinned {}", content_hash),
            Err(e) => warn!("Could not unpin {}: {}", content_hash, e),
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("executor", &self.executor.name())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirrorError;
    use crate::mirror::MirrorOutcome;
    use async_trait::async_trait;

    struct FixedMirror;

    #[async_trait]
    impl MirrorExecutor for FixedMirror {
        async fn mirror(&self, link: &str) -> Result<MirrorOutcome, MirrorError> {
            Ok(MirrorOutcome {
                content_hash: format!("Qm{}", link.len()),
                commit: None,
                name: None,
            })
        }

        async fn unpin(&self, _content_hash: &str) -> Result<(), MirrorError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_sync_of_untracked_link_leaves_no_lock_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RepoStore::open(dir.path()).unwrap());
        let engine = SyncEngine::new(store, Arc::new(FixedMirror), SyncOptions::default());

        let err = engine.sync("/srv/gone").await.unwrap_err();

        assert!(matches!(err, SyncError::NotFound(ref l) if l == "/srv/gone"));
        assert!(engine.locks.is_empty());
    }
}
