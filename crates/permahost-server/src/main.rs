//! Permaweb Host daemon binary.

use std::sync::Arc;

use anyhow::Context;
use permahost_mirror::{CliMirror, RefreshScheduler, SyncEngine};
use permahost_server::bootstrap::{self, HomeLayout};
use permahost_server::metrics::init_metrics;
use permahost_server::{AppState, Settings, create_router_with_metrics, run_server, with_cors};
use permahost_store::RepoStore;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let default_file = bootstrap::default_home().map(|home| HomeLayout::new(home).config_file());
    let settings = Settings::load(default_file.as_deref()).context("Failed to load settings")?;
    let addr = settings.addr()?;

    tracing::info!("Starting Permaweb Host v{}", env!("CARGO_PKG_VERSION"));

    let layout = bootstrap::prepare(&settings)
        .await
        .context("Failed to prepare the host")?;
    tracing::info!("Home directory: {}", layout.home.display());

    let store = Arc::new(
        RepoStore::open(&layout.store_dir)
            .with_context(|| format!("Failed to open the store in {:?}", layout.store_dir))?,
    );
    tracing::info!("Tracking {} repositories", store.len()?);

    let mirror = CliMirror::new(settings.mirror_config(&layout.git_dir)?);
    let engine = Arc::new(SyncEngine::new(
        Arc::clone(&store),
        Arc::new(mirror),
        settings.sync_options(),
    ));

    let prometheus = init_metrics().context("Failed to install the metrics recorder")?;

    let scheduler = RefreshScheduler::new(Arc::clone(&engine), settings.refresh_config()).start();

    let mut app = create_router_with_metrics(AppState::new(Arc::clone(&engine)), prometheus);
    if settings.server.cors {
        app = with_cors(app);
    }

    run_server(addr, app, settings.shutdown_grace()).await?;

    tracing::info!("Stopping refresh scheduler");
    if !scheduler.shutdown(settings.shutdown_grace()).await {
        tracing::warn!("Running syncs were abandoned");
    }

    drop(engine);
    match Arc::into_inner(store) {
        Some(store) => {
            store.close();
            tracing::info!("Store closed");
        },
        None => tracing::warn!("Store still in use at shutdown, closing on exit"),
    }

    Ok(())
}
