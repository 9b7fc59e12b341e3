//! The tracked repository record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::link::Link;

/// Lifecycle status of a tracked repository, derived from its record.
///
/// The transient "syncing" state is not part of the record: it only exists
/// while a sync holds the repository's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoStatus {
    /// Registered, never synced and no attempt has failed yet.
    Registered,
    /// The most recent sync succeeded.
    Synced,
    /// The most recent sync failed.
    Failed,
}

impl fmt::Display for RepoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Registered => "registered",
            Self::Synced => "synced",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// The result of a fully successful clone, add and pin sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSuccess {
    /// Content identifier of the mirrored tree.
    pub content_hash: String,
    /// HEAD commit of the mirrored tree, absent for an empty repository.
    pub commit: Option<String>,
    /// Stable name the content hash was published under.
    pub name: Option<String>,
    /// When the sync completed.
    pub synced_at: DateTime<Utc>,
}

/// One tracked repository.
///
/// Content fields only move forward through [`RepoRecord::record_success`],
/// which replaces all of them at once. A failure only touches the error
/// annotation, so readers always see the last good state.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use permahost_core::{Link, RepoRecord, RepoStatus, SyncSuccess};
///
/// let link = Link::parse("https://example.com/a.git").unwrap();
/// let mut record = RepoRecord::new(&link, Utc::now());
/// assert_eq!(record.status(), RepoStatus::Registered);
///
/// record.record_success(SyncSuccess {
///     content_hash: "Qm123".into(),
///     commit: None,
///     name: None,
///     synced_at: Utc::now(),
/// });
/// assert!(record.pinned());
/// assert_eq!(record.status(), RepoStatus::Synced);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoRecord {
    link: String,

    #[serde(default)]
    content_hash: String,

    #[serde(default)]
    pinned: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_synced_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,

    registered_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    commit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default)]
    failure_count: u32,
}

impl RepoRecord {
    /// Creates a freshly registered record.
    pub fn new(link: &Link, registered_at: DateTime<Utc>) -> Self {
        Self {
            link: link.as_str().to_string(),
            content_hash: String::new(),
            pinned: false,
            last_synced_at: None,
            last_error: None,
            registered_at,
            commit: None,
            name: None,
            failure_count: 0,
        }
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    /// Latest content identifier, empty until the first successful sync.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub fn commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }

    /// Stable name of the repository, once published.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of consecutive failed syncs.
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Returns the lifecycle status of the record.
    pub fn status(&self) -> RepoStatus {
        if self.last_error.is_some() {
            RepoStatus::Failed
        } else if self.last_synced_at.is_some() {
            RepoStatus::Synced
        } else {
            RepoStatus::Registered
        }
    }

    /// Applies a successful sync.
    ///
    /// Returns the previously pinned content hash when it was replaced by a
    /// different one, so the caller can release it.
    pub fn record_success(&mut self, success: SyncSuccess) -> Option<String> {
        let previous = (self.pinned && self.content_hash != success.content_hash)
            .then(|| self.content_hash.clone());

        self.pinned = !success.content_hash.is_empty();
        self.content_hash = success.content_hash;
        self.commit = success.commit;
        self.name = success.name;
        self.last_synced_at = Some(success.synced_at);
        self.last_error = None;
        self.failure_count = 0;

        previous
    }

    /// Applies a failed sync, leaving every content field untouched.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.failure_count = self.failure_count.saturating_add(1);
    }
}
