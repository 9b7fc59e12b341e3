//! Mirror executor backed by the git, IPFS and IPFS cluster CLIs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use permahost_core::link::slug;
use tracing::{debug, info, warn};

use super::command::{CommandRunner, last_line};
use super::{MirrorConfig, MirrorExecutor, MirrorOutcome};
use crate::error::{MirrorError, MirrorStep};

/// Publishes repositories by shelling out to `git`, `ipfs` and
/// `ipfs-cluster-ctl`.
///
/// Each repository gets a bare mirror under `<git_dir>/<slug>`, with server
/// info kept current so the added tree can be cloned over plain HTTP from
/// any IPFS gateway.
pub struct CliMirror {
    config: MirrorConfig,
    runner: CommandRunner,
}

impl CliMirror {
    /// Creates a new CliMirror instance.
    pub fn new(config: MirrorConfig) -> Self {
        let runner = CommandRunner::new(config.step_timeout());
        Self { config, runner }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Returns the working area of `link`.
    pub fn working_area(&self, link: &str) -> PathBuf {
        self.config.git_dir().join(slug(link))
    }

    /// Clones or updates the working area and returns its HEAD commit.
    async fn clone_or_update(&self, link: &str, dir: &Path) -> Result<Option<String>, MirrorError> {
        let git = self.config.git_bin();

        if is_repository(dir) {
            debug!("Updating {} in {:?}", link, dir);
            self.runner
                .run(
                    MirrorStep::Update,
                    git,
                    [os("-C"), dir.as_os_str(), os("remote"), os("update"), os("--prune")],
                )
                .await?;
        } else {
            // Leftovers of an interrupted clone would make git refuse the target.
            if dir.exists() {
                tokio::fs::remove_dir_all(dir).await?;
            }
            tokio::fs::create_dir_all(self.config.git_dir()).await?;

            info!("Cloning {} into {:?}", link, dir);
            let cloned = self
                .runner
                .run(
                    MirrorStep::Clone,
                    git,
                    [os("clone"), os("--mirror"), os("--"), os(link), dir.as_os_str()],
                )
                .await;

            if let Err(e) = cloned {
                if dir.exists()
                    && let Err(cleanup) = tokio::fs::remove_dir_all(dir).await
                {
                    warn!("Could not remove partial clone {:?}: {}", dir, cleanup);
                }
                return Err(e);
            }
        }

        self.runner
            .run(
                MirrorStep::ServerInfo,
                git,
                [os("-C"), dir.as_os_str(), os("update-server-info")],
            )
            .await?;

        // An empty repository has no HEAD to resolve yet.
        let head = self
            .runner
            .run(
                MirrorStep::Update,
                git,
                [os("-C"), dir.as_os_str(), os("rev-parse"), os("HEAD")],
            )
            .await;

        Ok(match head {
            Ok(out) => last_line(&out).map(String::from),
            Err(e) => {
                debug!("No HEAD commit for {}: {}", link, e);
                None
            },
        })
    }

    /// Adds the working area to IPFS and returns its content identifier.
    async fn content_add(&self, dir: &Path) -> Result<String, MirrorError> {
        let ipfs = self.config.ipfs_bin();
        let out = self
            .runner
            .run(
                MirrorStep::Add,
                ipfs,
                [os("add"), os("-r"), os("-Q"), os("--pin=false"), dir.as_os_str()],
            )
            .await?;

        last_line(&out)
            .map(String::from)
            .ok_or_else(|| MirrorError::EmptyOutput {
                step: MirrorStep::Add,
                program: ipfs.to_string(),
            })
    }

    async fn cluster(&self, step: MirrorStep, args: &[&str]) -> Result<String, MirrorError> {
        let mut full: Vec<&str> = Vec::with_capacity(args.len() + 2);
        if let Some(host) = self.config.cluster_host() {
            full.extend(["--host", host]);
        }
        full.extend_from_slice(args);

        self.runner
            .run(step, self.config.cluster_ctl_bin(), full)
            .await
    }

    /// Publishes `content_hash` under the IPNS key named `key` and returns
    /// the resulting name.
    async fn publish(&self, key: &str, content_hash: &str) -> Result<String, MirrorError> {
        let ipfs = self.config.ipfs_bin();

        let keys = self
            .runner
            .run(MirrorStep::Publish, ipfs, ["key", "list"])
            .await?;
        if !keys.lines().any(|line| line.trim() == key) {
            info!("Generating IPNS key {}", key);
            self.runner
                .run(MirrorStep::Publish, ipfs, ["key", "gen", key])
                .await?;
        }

        let target = format!("/ipfs/{}", content_hash);
        let key_arg = format!("--key={}", key);
        let out = self
            .runner
            .run(
                MirrorStep::Publish,
                ipfs,
                ["name", "publish", key_arg.as_str(), "--quieter", target.as_str()],
            )
            .await?;

        last_line(&out)
            .map(parse_published_name)
            .ok_or_else(|| MirrorError::EmptyOutput {
                step: MirrorStep::Publish,
                program: ipfs.to_string(),
            })
    }
}

#[async_trait]
impl MirrorExecutor for CliMirror {
    async fn mirror(&self, link: &str) -> Result<MirrorOutcome, MirrorError> {
        let key = slug(link);
        let dir = self.config.git_dir().join(&key);

        let commit = self.clone_or_update(link, &dir).await?;
        let content_hash = self.content_add(&dir).await?;
        debug!("Added {} as {}", link, content_hash);

        // The pin is requested only once every other step succeeded.
        let name = if self.config.publish_names() {
            Some(self.publish(&key, &content_hash).await?)
        } else {
            None
        };

        self.cluster(MirrorStep::Pin, &["pin", "add", content_hash.as_str()])
            .await?;

        Ok(MirrorOutcome {
            content_hash,
            commit,
            name,
        })
    }

    async fn unpin(&self, content_hash: &str) -> Result<(), MirrorError> {
        self.cluster(MirrorStep::Unpin, &["pin", "rm", content_hash])
            .await?;
        Ok(())
    }

    async fn discard(&self, link: &str) -> Result<(), MirrorError> {
        let dir = self.working_area(link);
        if dir.exists() {
            tokio::fs::remove_dir_all(&dir).await?;
            info!("Removed working area {:?}", dir);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "cli"
    }
}

impl std::fmt::Debug for CliMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliMirror")
            .field("git_dir", &self.config.git_dir())
            .field("publish_names", &self.config.publish_names())
            .finish()
    }
}

/// A bare or mirror repository keeps HEAD at its root.
fn is_repository(dir: &Path) -> bool {
    dir.join("HEAD").is_file()
}

/// Accepts both `--quieter` output and the verbose "Published to" line.
fn parse_published_name(line: &str) -> String {
    line.strip_prefix("Published to ")
        .and_then(|rest| rest.split(':').next())
        .unwrap_or(line)
        .to_string()
}

fn os(s: &str) -> &std::ffi::OsStr {
    std::ffi::OsStr::new(s)
}
