//! Error types for the mirror pipeline.

use std::fmt;

use permahost_store::StoreError;

/// The external sub-steps of a mirror run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorStep {
    /// First clone of the source into the working area.
    Clone,
    /// Update of an existing working area.
    Update,
    /// Regeneration of the dumb HTTP server info.
    ServerInfo,
    /// Content addressing of the working area.
    Add,
    /// Cluster pinning of the content identifier.
    Pin,
    /// Publication of the content identifier under a stable name.
    Publish,
    /// Release of a cluster pin.
    Unpin,
}

impl fmt::Display for MirrorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Clone => "clone",
            Self::Update => "update",
            Self::ServerInfo => "update-server-info",
            Self::Add => "content add",
            Self::Pin => "pin",
            Self::Publish => "publish",
            Self::Unpin => "unpin",
        };
        write!(f, "{}", s)
    }
}

/// Errors that can occur while running external mirror operations.
///
/// All of these are per-repository and transient: they are recorded on the
/// repository and retried on the next refresh.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The program ran and exited unsuccessfully.
    #[error("{step} failed: {program} exited with {status}: {stderr}")]
    Command {
        step: MirrorStep,
        program: String,
        status: String,
        stderr: String,
    },

    /// The program could not be started.
    #[error("{step} failed: could not run {program}: {source}")]
    Spawn {
        step: MirrorStep,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program did not finish in time.
    #[error("{step} timed out after {seconds}s")]
    Timeout { step: MirrorStep, seconds: u64 },

    /// The program succeeded without printing the expected value.
    #[error("{step} failed: {program} produced no output")]
    EmptyOutput { step: MirrorStep, program: String },

    /// An I/O error occurred in the working area.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MirrorError {
    /// Returns the sub-step that failed, if the error belongs to one.
    pub fn step(&self) -> Option<MirrorStep> {
        match self {
            Self::Command { step, .. }
            | Self::Spawn { step, .. }
            | Self::Timeout { step, .. }
            | Self::EmptyOutput { step, .. } => Some(*step),
            Self::Io(_) => None,
        }
    }

    /// Returns true if the error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors returned by the sync engine.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The link is not tracked.
    #[error("repository not found: {0}")]
    NotFound(String),

    /// The link is already tracked.
    #[error("repository already tracked: {0}")]
    AlreadyTracked(String),

    /// The store failed.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(link) => Self::NotFound(link),
            StoreError::AlreadyExists(link) => Self::AlreadyTracked(link),
            other => Self::Store(other),
        }
    }
}
