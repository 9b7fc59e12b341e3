//! Permahost Server - HTTP API and daemon for Permaweb Host
//!
//! This crate provides the Axum-based repository API, settings loading and
//! startup bootstrap of the `permahost` binary.

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod state;

pub use error::AppError;
pub use handlers::health::HealthResponse;
pub use handlers::response::RepoResponse;
pub use server::{
    create_router, create_router_with_metrics, run_server, serve_with_shutdown, with_cors,
};
pub use settings::{Settings, SettingsError};
pub use state::AppState;

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
}
