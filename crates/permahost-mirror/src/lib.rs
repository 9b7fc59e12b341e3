//! # Permahost Mirror
//!
//! The repository publishing pipeline of Permaweb Host.
//!
//! This crate clones tracked Git repositories, adds them to IPFS, pins the
//! resulting content identifiers on an IPFS cluster and keeps them fresh.
//!
//! ## Features
//!
//! - External operations via the `git`, `ipfs` and `ipfs-cluster-ctl` CLIs
//! - Async trait-based mirror executor abstraction
//! - Per-link serialization of syncs
//! - Last-good-state persistence of every sync outcome
//! - Background refresh with a configurable interval
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use permahost_mirror::{CliMirror, MirrorConfig, RefreshScheduler, SyncEngine, SyncOptions};
//!
//! let config = MirrorConfig::builder()
//!     .git_dir("/home/me/.config/permaweb/host/git")
//!     .build()?;
//!
//! let engine = Arc::new(SyncEngine::new(store, Arc::new(CliMirror::new(config)), SyncOptions::default()));
//! let record = engine.register(&link).await?;
//!
//! let handle = RefreshScheduler::with_defaults(engine).start();
//! ```

pub mod error;
pub mod mirror;
pub mod sync;

// Re-exports
pub use error::{MirrorError, MirrorStep, SyncError};
pub use mirror::{CliMirror, MirrorConfig, MirrorExecutor, MirrorOutcome};
pub use sync::{
    RefreshConfig, RefreshHandle, RefreshScheduler, RefreshSummary, SyncEngine, SyncLocks,
    SyncOptions,
};
