//! Startup preparation of the host machine.
//!
//! Resolves and creates the home directory, moves a legacy one into place,
//! checks the external programs and prepares the local IPFS node.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::settings::{MirrorSettings, Settings};

/// Home directory, relative to the user's home.
const HOME_DIR: &str = ".config/permaweb/host";

/// Home directory of earlier releases, relative to the user's home.
const LEGACY_HOME_DIR: &str = ".config/gi";

/// Longest wait for one best-effort IPFS call.
const IPFS_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that stop the daemon before it serves.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The user's home directory is unknown and no override is set.
    #[error("could not determine the home directory; set storage.home")]
    NoHomeDirectory,

    /// A directory could not be created.
    #[error("could not create {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required program is not installed.
    #[error("{program} is not installed: {source}")]
    MissingProgram {
        program: String,
        #[source]
        source: which::Error,
    },
}

/// Directories the daemon works in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLayout {
    pub home: PathBuf,
    /// Key-value store files.
    pub store_dir: PathBuf,
    /// One working area per tracked repository.
    pub git_dir: PathBuf,
}

impl HomeLayout {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            store_dir: home.join("store"),
            git_dir: home.join("git"),
            home,
        }
    }

    /// Returns the settings file inside the home directory.
    pub fn config_file(&self) -> PathBuf {
        self.home.join(crate::settings::CONFIG_FILE)
    }
}

/// Returns the default home directory.
pub fn default_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HOME_DIR))
}

/// Returns the home directory of earlier releases.
pub fn legacy_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LEGACY_HOME_DIR))
}

/// Resolves the home directory from the settings.
pub fn resolve_home(settings: &Settings) -> Result<HomeLayout, BootstrapError> {
    let home = match &settings.storage.home {
        Some(home) => home.clone(),
        None => default_home().ok_or(BootstrapError::NoHomeDirectory)?,
    };
    Ok(HomeLayout::new(home))
}

/// Moves `legacy` to `home` when only the former exists.
///
/// Returns true if a move happened. Failures are logged and ignored.
pub fn migrate_legacy(legacy: &Path, home: &Path) -> bool {
    if !legacy.is_dir() || home.exists() {
        return false;
    }

    if let Some(parent) = home.parent()
        && let Err(e) = create_private_dir(parent)
    {
        warn!("Could not prepare {:?} for the legacy home: {}", parent, e);
        return false;
    }

    match std::fs::rename(legacy, home) {
        Ok(()) => {
            info!("Moved legacy home {:?} to {:?}", legacy, home);
            true
        },
        Err(e) => {
            warn!("Could not move legacy home {:?} to {:?}: {}", legacy, home, e);
            false
        },
    }
}

/// Creates the home directory and its subdirectories, owner-only.
pub fn prepare_home(layout: &HomeLayout) -> Result<(), BootstrapError> {
    for dir in [&layout.home, &layout.store_dir, &layout.git_dir] {
        create_private_dir(dir).map_err(|source| BootstrapError::Directory {
            path: dir.clone(),
            source,
        })?;
    }
    debug!("Home directory ready at {:?}", layout.home);
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Checks that every external program resolves and logs where it lives.
pub fn check_programs(mirror: &MirrorSettings) -> Result<Vec<PathBuf>, BootstrapError> {
    let programs = [
        ("Git", &mirror.git_bin),
        ("IPFS", &mirror.ipfs_bin),
        ("IPFS Cluster Service", &mirror.cluster_service_bin),
        ("IPFS Cluster Control", &mirror.cluster_ctl_bin),
    ];

    let mut resolved = Vec::with_capacity(programs.len());
    for (label, program) in programs {
        let path = which::which(program).map_err(|source| BootstrapError::MissingProgram {
            program: program.clone(),
            source,
        })?;
        info!("{}: {}", label, path.display());
        resolved.push(path);
    }
    Ok(resolved)
}

/// Enables sharding and connects the local node to the configured peers.
///
/// Every step is best effort.
pub async fn prepare_ipfs(mirror: &MirrorSettings) {
    if mirror.enable_sharding {
        ipfs(
            &mirror.ipfs_bin,
            &["config", "--json", "Experimental.ShardingEnabled", "true"],
        )
        .await;
    }

    for peer in &mirror.swarm_peers {
        if ipfs(&mirror.ipfs_bin, &["swarm", "connect", peer.as_str()]).await {
            debug!("Connected to {}", peer);
        }
    }
}

/// Runs one best-effort IPFS command and reports whether it succeeded.
async fn ipfs(program: &str, args: &[&str]) -> bool {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(IPFS_CALL_TIMEOUT, command.output()).await {
        Ok(Ok(output)) if output.status.success() => true,
        Ok(Ok(output)) => {
            warn!(
                "{} {} exited with {}: {}",
                program,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            false
        },
        Ok(Err(e)) => {
            warn!("Could not run {} {}: {}", program, args.join(" "), e);
            false
        },
        Err(_) => {
            warn!("{} {} timed out", program, args.join(" "));
            false
        },
    }
}

/// Runs every startup step that does not need the store.
pub async fn prepare(settings: &Settings) -> Result<HomeLayout, BootstrapError> {
    let layout = resolve_home(settings)?;

    if settings.storage.home.is_none()
        && let Some(legacy) = legacy_home()
    {
        migrate_legacy(&legacy, &layout.home);
    }

    prepare_home(&layout)?;
    check_programs(&settings.mirror)?;
    prepare_ipfs(&settings.mirror).await;

    Ok(layout)
}
