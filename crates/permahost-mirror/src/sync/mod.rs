//! Repository synchronization and refresh scheduling.
//!
//! This module drives tracked repositories through their lifecycle and
//! refreshes all of them on a fixed schedule.

mod engine;
mod locks;
mod scheduler;

pub use engine::{SyncEngine, SyncOptions};
pub use locks::{SyncGuard, SyncLocks};
pub use scheduler::{RefreshConfig, RefreshHandle, RefreshScheduler, RefreshSummary};
