//! CLI mirror configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the CLI mirror executor.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Directory holding one working area per tracked repository.
    git_dir: PathBuf,

    /// Git executable.
    git_bin: String,

    /// IPFS executable.
    ipfs_bin: String,

    /// IPFS cluster control executable.
    cluster_ctl_bin: String,

    /// Cluster control endpoint passed as `--host` (optional).
    cluster_host: Option<String>,

    /// Timeout applied to every external invocation (`None` waits forever).
    step_timeout: Option<Duration>,

    /// Whether to publish every content identifier under a stable name.
    publish_names: bool,
}

fn default_step_timeout() -> Option<Duration> {
    Some(Duration::from_secs(600))
}

impl MirrorConfig {
    /// Creates a new builder for MirrorConfig.
    pub fn builder() -> MirrorConfigBuilder {
        MirrorConfigBuilder::default()
    }

    /// Returns the working area root.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn git_bin(&self) -> &str {
        &self.git_bin
    }

    pub fn ipfs_bin(&self) -> &str {
        &self.ipfs_bin
    }

    pub fn cluster_ctl_bin(&self) -> &str {
        &self.cluster_ctl_bin
    }

    /// Returns the cluster control endpoint, if one is configured.
    pub fn cluster_host(&self) -> Option<&str> {
        self.cluster_host.as_deref()
    }

    /// Returns the per-invocation timeout.
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout
    }

    /// Returns whether stable names are published.
    pub fn publish_names(&self) -> bool {
        self.publish_names
    }
}

/// Builder for MirrorConfig.
#[derive(Debug)]
pub struct MirrorConfigBuilder {
    git_dir: Option<PathBuf>,
    git_bin: Option<String>,
    ipfs_bin: Option<String>,
    cluster_ctl_bin: Option<String>,
    cluster_host: Option<String>,
    step_timeout: Option<Duration>,
    publish_names: bool,
}

impl Default for MirrorConfigBuilder {
    fn default() -> Self {
        Self {
            git_dir: None,
            git_bin: None,
            ipfs_bin: None,
            cluster_ctl_bin: None,
            cluster_host: None,
            step_timeout: default_step_timeout(),
            publish_names: true,
        }
    }
}

impl MirrorConfigBuilder {
    /// Sets the working area root.
    pub fn git_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.git_dir = Some(path.into());
        self
    }

    /// Sets the git executable.
    pub fn git_bin(mut self, bin: impl Into<String>) -> Self {
        self.git_bin = Some(bin.into());
        self
    }

    /// Sets the IPFS executable.
    pub fn ipfs_bin(mut self, bin: impl Into<String>) -> Self {
        self.ipfs_bin = Some(bin.into());
        self
    }

    /// Sets the cluster control executable.
    pub fn cluster_ctl_bin(mut self, bin: impl Into<String>) -> Self {
        self.cluster_ctl_bin = Some(bin.into());
        self
    }

    /// Sets the cluster control endpoint.
    pub fn cluster_host(mut self, host: impl Into<String>) -> Self {
        self.cluster_host = Some(host.into());
        self
    }

    /// Sets the per-invocation timeout. `None` disables it.
    pub fn step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Sets whether stable names are published.
    pub fn publish_names(mut self, publish: bool) -> Self {
        self.publish_names = publish;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<MirrorConfig, &'static str> {
        let git_dir = self.git_dir.ok_or("git_dir is required")?;

        if self.step_timeout.is_some_and(|t| t.is_zero()) {
            return Err("step_timeout must be positive");
        }

        Ok(MirrorConfig {
            git_dir,
            git_bin: self.git_bin.unwrap_or_else(|| "git".to_string()),
            ipfs_bin: self.ipfs_bin.unwrap_or_else(|| "ipfs".to_string()),
            cluster_ctl_bin: self
                .cluster_ctl_bin
                .unwrap_or_else(|| "ipfs-cluster-ctl".to_string()),
            cluster_host: self.cluster_host,
            step_timeout: self.step_timeout,
            publish_names: self.publish_names,
        })
    }
}
