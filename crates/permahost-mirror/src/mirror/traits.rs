//! Mirror executor trait definition.

use async_trait::async_trait;

use crate::error::MirrorError;

/// What a successful mirror run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOutcome {
    /// Content identifier of the mirrored tree, pinned on the cluster.
    pub content_hash: String,
    /// HEAD commit of the tree, absent for an empty repository.
    pub commit: Option<String>,
    /// Stable name the content identifier was published under.
    pub name: Option<String>,
}

impl MirrorOutcome {
    /// Creates an outcome carrying only a content identifier.
    pub fn new(content_hash: impl Into<String>) -> Self {
        Self {
            content_hash: content_hash.into(),
            commit: None,
            name: None,
        }
    }
}

/// Runs the external operations that publish one repository.
///
/// Both operations may block for as long as the external programs run.
/// Callers must not hold any lock other than the repository's sync lock
/// while awaiting them.
///
/// # Implementors
///
/// - `CliMirror` - Shells out to `git`, `ipfs` and `ipfs-cluster-ctl`
#[async_trait]
pub trait MirrorExecutor: Send + Sync {
    /// Clones or updates `link`, adds the tree to IPFS and pins the result.
    ///
    /// # Errors
    ///
    /// Returns the first sub-step failure; later sub-steps are not attempted.
    async fn mirror(&self, link: &str) -> Result<MirrorOutcome, MirrorError>;

    /// Releases the cluster pin of `content_hash`.
    async fn unpin(&self, content_hash: &str) -> Result<(), MirrorError>;

    /// Removes the local working area of `link`.
    ///
    /// The default implementation keeps nothing locally and does nothing.
    async fn discard(&self, _link: &str) -> Result<(), MirrorError> {
        Ok(())
    }

    /// Returns the name of this executor, for logging.
    fn name(&self) -> &str;
}
