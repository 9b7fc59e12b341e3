//! Application state.

use std::sync::Arc;

use permahost_mirror::SyncEngine;
use permahost_store::RepoStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The sync engine, which also owns the repo store.
    engine: Arc<SyncEngine>,
}

impl AppState {
    /// Creates a new AppState around the given engine.
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    /// Returns the sync engine.
    pub fn engine(&self) -> &SyncEngine {
        self.engine.as_ref()
    }

    /// Returns the repo store.
    pub fn store(&self) -> &RepoStore {
        self.engine.store().as_ref()
    }
}
