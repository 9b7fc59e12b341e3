//! Error types for the repository store.

/// Errors that can occur when reading or writing tracked repositories.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the link.
    #[error("repository not found: {0}")]
    NotFound(String),

    /// A record already exists for the link.
    #[error("repository already tracked: {0}")]
    AlreadyExists(String),

    /// A stored value could not be decoded.
    #[error("corrupt record for {link}: {reason}")]
    Corrupt { link: String, reason: String },

    /// A record could not be encoded.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    /// The underlying database failed.
    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Creates a new corrupt record error.
    pub fn corrupt(link: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            link: link.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(e: redb::DatabaseError) -> Self {
        Self::Database(e.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(e: redb::TransactionError) -> Self {
        Self::Database(e.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(e: redb::TableError) -> Self {
        Self::Database(e.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(e: redb::StorageError) -> Self {
        Self::Database(e.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(e: redb::CommitError) -> Self {
        Self::Database(e.into())
    }
}
