//! Metrics setup and initialization.

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Buckets for HTTP requests, in seconds.
const HTTP_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
    60.0,
];

/// Buckets for whole mirror runs, which take seconds to minutes.
const SYNC_BUCKETS: &[f64] = &[
    0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0,
];

/// Inicializa el sistema de metricas y retorna el handle para el endpoint.
///
/// # Errors
///
/// Fails if a recorder is already installed in this process.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets(HTTP_BUCKETS)?
        .set_buckets_for_metric(
            Matcher::Full("permahost_sync_duration_seconds".to_string()),
            SYNC_BUCKETS,
        )?
        .install_recorder()?;

    describe_metrics();

    info!("Metrics system initialized");
    Ok(handle)
}

/// Describes every metric the daemon records.
pub fn describe_metrics() {
    super::http::register_http_metrics();

    metrics::describe_counter!(
        "permahost_sync_total",
        "Mirror runs by outcome (success or failure)"
    );
    metrics::describe_histogram!(
        "permahost_sync_duration_seconds",
        metrics::Unit::Seconds,
        "Duration of one mirror run"
    );
    metrics::describe_gauge!(
        "permahost_tracked_repos",
        "Number of tracked repositories at the last refresh"
    );
}
