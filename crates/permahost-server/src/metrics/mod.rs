//! Metrics module for Permaweb Host.

pub mod http;
pub mod setup;

pub use setup::{describe_metrics, init_metrics};
