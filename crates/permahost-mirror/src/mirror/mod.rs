//! Mirror executors.
//!
//! This module defines the executor abstraction and its CLI implementation,
//! which drives the `git`, `ipfs` and `ipfs-cluster-ctl` programs.

mod cli;
mod command;
mod config;
mod traits;

pub use cli::CliMirror;
pub use config::{MirrorConfig, MirrorConfigBuilder};
pub use traits::{MirrorExecutor, MirrorOutcome};
