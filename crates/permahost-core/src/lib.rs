//! Permahost Core - Domain types
//!
//! This crate provides the foundational types shared by the store, the
//! mirror pipeline and the HTTP server: the tracked repository record,
//! the validated tracking link and the errors raised while building them.

pub mod error;
pub mod link;
pub mod record;

pub use error::{CoreError, Result};
pub use link::Link;
pub use record::{RepoRecord, RepoStatus, SyncSuccess};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_defined() {
        assert!(!version().is_empty());
    }

    #[test]
    fn version_is_semver() {
        let v = version();
        assert_eq!(v.split('.').count(), 3, "Version should be semver");
    }
}
