//! Daemon settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `PERMAHOST_*` environment variables. Sections are separated by a double
//! underscore, so `PERMAHOST_SERVER__PORT=8080` sets `server.port`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use permahost_mirror::{MirrorConfig, RefreshConfig, SyncOptions};
use serde::Deserialize;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "PERMAHOST_CONFIG";

/// Settings file looked up in the home directory.
pub const CONFIG_FILE: &str = "host.toml";

/// Errors that can occur while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A source could not be read or deserialized.
    #[error("could not load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Enables a permissive CORS layer.
    pub cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 62458,
            cors: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the home directory holding the store and working areas.
    pub home: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    pub interval_secs: u64,
    pub run_on_start: bool,
    pub concurrency: usize,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_secs: 24 * 60 * 60,
            run_on_start: true,
            concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorSettings {
    pub git_bin: String,
    pub ipfs_bin: String,
    pub cluster_ctl_bin: String,
    pub cluster_service_bin: String,
    pub cluster_host: Option<String>,
    /// Timeout of every external invocation; 0 disables it.
    pub step_timeout_secs: u64,
    pub publish_names: bool,
    pub unpin_replaced: bool,
    pub enable_sharding: bool,
    /// Peers connected to at startup.
    pub swarm_peers: Vec<String>,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            git_bin: "git".to_string(),
            ipfs_bin: "ipfs".to_string(),
            cluster_ctl_bin: "ipfs-cluster-ctl".to_string(),
            cluster_service_bin: "ipfs-cluster-service".to_string(),
            cluster_host: None,
            step_timeout_secs: 600,
            publish_names: true,
            unpin_replaced: true,
            enable_sharding: true,
            swarm_peers: vec![
                "/dnsaddr/bootstrap.libp2p.io/p2p/QmNnooDu7bfjPFoTZYxMNLWUQJyrVwtbZg5gBMjTezGAJN"
                    .to_string(),
                "/dnsaddr/bootstrap.libp2p.io/p2p/QmQCU2EcMqAqQPR2i9bChDtGNJchTbq5TbXJJ16u19uLTa"
                    .to_string(),
            ],
        }
    }
}

impl MirrorSettings {
    /// Returns the per-invocation timeout.
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs))
    }
}

/// All daemon settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub refresh: RefreshSettings,
    pub mirror: MirrorSettings,
    /// How long shutdown waits for running syncs.
    pub shutdown_grace_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            refresh: RefreshSettings::default(),
            mirror: MirrorSettings::default(),
            shutdown_grace_secs: 30,
        }
    }
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// The file named by `PERMAHOST_CONFIG` must exist; `default_file`
    /// is read only if present.
    pub fn load(default_file: Option<&Path>) -> Result<Self, SettingsError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from(Some(Path::new(&path)), true, None),
            None => Self::load_from(default_file, false, None),
        }
    }

    /// Loads settings from `file` and the environment.
    ///
    /// `env` replaces the process environment when given.
    pub fn load_from(
        file: Option<&Path>,
        required: bool,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(required));
        }

        builder = builder.add_source(
            Environment::with_prefix("PERMAHOST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("mirror.swarm_peers")
                .source(env),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values the daemon cannot run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.refresh.interval_secs == 0 {
            return Err(SettingsError::invalid(
                "refresh.interval_secs",
                "must be greater than zero",
            ));
        }
        if self.refresh.concurrency == 0 {
            return Err(SettingsError::invalid(
                "refresh.concurrency",
                "must be greater than zero",
            ));
        }
        self.addr()?;
        Ok(())
    }

    /// Returns the listen address.
    pub fn addr(&self) -> Result<SocketAddr, SettingsError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| SettingsError::invalid("server.host", format!("{}", e)))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            interval: Duration::from_secs(self.refresh.interval_secs),
            run_on_start: self.refresh.run_on_start,
            concurrency: self.refresh.concurrency,
        }
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            unpin_replaced: self.mirror.unpin_replaced,
        }
    }

    /// Builds the CLI mirror configuration for working areas under `git_dir`.
    pub fn mirror_config(&self, git_dir: &Path) -> Result<MirrorConfig, SettingsError> {
        let mirror = &self.mirror;
        let mut builder = MirrorConfig::builder()
            .git_dir(git_dir)
            .git_bin(&mirror.git_bin)
            .ipfs_bin(&mirror.ipfs_bin)
            .cluster_ctl_bin(&mirror.cluster_ctl_bin)
            .step_timeout(mirror.step_timeout())
            .publish_names(mirror.publish_names);

        if let Some(host) = &mirror.cluster_host {
            builder = builder.cluster_host(host);
        }

        builder
            .build()
            .map_err(|reason| SettingsError::invalid("mirror", reason))
    }
}
