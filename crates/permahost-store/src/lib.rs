//! # Permahost Store
//!
//! Durable mapping from a tracking link to its [`RepoRecord`], kept in an
//! embedded ordered key-value database.
//!
//! Every operation is atomic for a single key. `list_all` reads from one
//! snapshot, so it is consistent at the time it is called but may miss a
//! write that commits while it runs.
//!
//! [`RepoRecord`]: permahost_core::RepoRecord

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{RepoStore, STORE_FILE};
