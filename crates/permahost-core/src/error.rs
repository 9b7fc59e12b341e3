//! Error types for Permaweb Host domain values.
//!
//! Errors raised here are request-level: they describe input that can
//! never become a tracked repository and carry no state mutation.

use thiserror::Error;

/// Errors produced while building domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The supplied link cannot be used as a tracking key.
    #[error("Invalid link '{link}': {reason}")]
    InvalidLink {
        /// The rejected input, as supplied
        link: String,
        /// Why it was rejected
        reason: String,
    },
}

impl CoreError {
    /// Creates an InvalidLink error.
    ///
    /// # Example
    ///
    /// ```
    /// use permahost_core::CoreError;
    ///
    /// let error = CoreError::invalid_link("", "link cannot be empty");
    /// assert!(error.to_string().contains("cannot be empty"));
    /// ```
    pub fn invalid_link(link: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLink {
            link: link.into(),
            reason: reason.into(),
        }
    }

    /// Returns the human readable reason of the error.
    pub fn reason(&self) -> &str {
        match self {
            Self::InvalidLink { reason, .. } => reason,
        }
    }
}

/// Result alias for domain operations.
pub type Result<T> = std::result::Result<T, CoreError>;
