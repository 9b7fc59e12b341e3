//! Background refresh scheduler.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use metrics::gauge;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use super::SyncEngine;
use crate::error::SyncError;

/// Configuration for the refresh scheduler.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between refresh passes.
    pub interval: Duration,
    /// Whether the first pass runs immediately instead of after one interval.
    pub run_on_start: bool,
    /// Maximum number of repositories synced at the same time.
    pub concurrency: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            run_on_start: true,
            concurrency: 1,
        }
    }
}

/// Outcome counts of one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Repositories whose mirror run succeeded.
    pub synced: usize,
    /// Repositories whose mirror run failed.
    pub failed: usize,
    /// Repositories removed during the pass, or not reached before shutdown.
    pub skipped: usize,
}

impl RefreshSummary {
    /// Returns the number of repositories the pass looked at.
    pub fn total(&self) -> usize {
        self.synced + self.failed + self.skipped
    }
}

enum Outcome {
    Synced,
    Failed,
    Skipped,
}

/// Handle for controlling a running refresh scheduler.
pub struct RefreshHandle {
    /// Sender to signal shutdown.
    shutdown_tx: watch::Sender<bool>,
    /// The scheduler task.
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Signals the scheduler to stop.
    ///
    /// Syncs already running are allowed to finish; no new ones start.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stops the scheduler and waits up to `grace` for it to finish.
    ///
    /// Returns false if the grace period ran out and the task was aborted.
    pub async fn shutdown(mut self, grace: Duration) -> bool {
        self.stop();

        let Some(mut task) = self.task.take() else {
            return true;
        };

        match tokio::time::timeout(grace, &mut task).await {
            Ok(_) => true,
            Err(_) => {
                warn!("Refresh scheduler did not stop within {:?}, aborting", grace);
                task.abort();
                false
            },
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Background scheduler that re-syncs every tracked repository.
pub struct RefreshScheduler {
    /// The engine running each sync.
    engine: Arc<SyncEngine>,
    /// Configuration.
    config: RefreshConfig,
}

impl RefreshScheduler {
    /// Creates a new refresh scheduler.
    pub fn new(engine: Arc<SyncEngine>, config: RefreshConfig) -> Self {
        Self { engine, config }
    }

    /// Creates a scheduler with default configuration.
    pub fn with_defaults(engine: Arc<SyncEngine>) -> Self {
        Self::new(engine, RefreshConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Starts the background refresh task.
    ///
    /// Returns a handle that can be used to stop the scheduler.
    pub fn start(self) -> RefreshHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));

        RefreshHandle {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Runs the scheduler loop.
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let period = self.config.interval;
        let first = if self.config.run_on_start {
            Instant::now()
        } else {
            Instant::now() + period
        };

        let mut timer = interval_at(first, period);
        // A pass longer than the interval pushes the schedule back.
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Starting refresh scheduler with interval {:?} (run on start: {})",
            period, self.config.run_on_start
        );

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let summary = self.refresh(Some(&shutdown_rx)).await;
                    info!(
                        "Refresh pass finished: {} synced, {} failed, {} skipped",
                        summary.synced, summary.failed, summary.skipped
                    );

                    if *shutdown_rx.borrow() {
                        info!("Refresh scheduler shutting down");
                        break;
                    }
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Refresh scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Manually triggers a refresh of every tracked repository.
    pub async fn refresh_all(&self) -> RefreshSummary {
        info!("Manual refresh triggered");
        self.refresh(None).await
    }

    /// Syncs every tracked repository once.
    ///
    /// One repository failing never stops the others.
    async fn refresh(&self, shutdown: Option<&watch::Receiver<bool>>) -> RefreshSummary {
        let records = match self.engine.store().list_all() {
            Ok(records) => records,
            Err(e) => {
                warn!("Could not list tracked repositories: {}", e);
                return RefreshSummary::default();
            },
        };

        gauge!("permahost_tracked_repos").set(records.len() as f64);
        debug!("Refreshing {} repositories", records.len());

        let links: Vec<String> = records.iter().map(|r| r.link().to_string()).collect();
        let engine = &self.engine;

        let outcomes: Vec<Outcome> = stream::iter(links)
            .map(|link| async move {
                if shutdown.is_some_and(|rx| *rx.borrow()) {
                    return Outcome::Skipped;
                }

                match engine.sync(&link).await {
                    Ok(record) if record.last_error().is_some() => Outcome::Failed,
                    Ok(_) => Outcome::Synced,
                    Err(SyncError::NotFound(_)) => {
                        debug!("{} was removed before its refresh", link);
                        Outcome::Skipped
                    },
                    Err(e) => {
                        warn!("Refresh of {} failed: {}", link, e);
                        Outcome::Failed
                    },
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut summary = RefreshSummary::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Synced => summary.synced += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("config", &self.config)
            .finish()
    }
}
