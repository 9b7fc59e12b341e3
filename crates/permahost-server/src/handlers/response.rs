//! Response types for the repo API.

use permahost_core::{RepoRecord, RepoStatus};
use serde::{Deserialize, Serialize};

/// A tracked repository as returned by the API.
///
/// Carries every persisted record field plus two derived ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoResponse {
    #[serde(flatten)]
    pub record: RepoRecord,

    /// Derived lifecycle state.
    pub status: RepoStatus,

    /// Whether a sync of this repository is running right now.
    pub syncing: bool,
}

impl RepoResponse {
    pub fn new(record: RepoRecord, syncing: bool) -> Self {
        Self {
            status: record.status(),
            record,
            syncing,
        }
    }
}

/// Body of a registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub link: Option<String>,
}
