use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router, middleware,
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::handlers::{
    health::health_check,
    metrics::metrics_handler,
    repos::{delete_repo, get_repo, list_repos, register_repo},
};
use crate::middleware::{LoggingLayer, RequestIdLayer};
use crate::state::AppState;

/// Routes of the repo API and the health endpoint.
fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Collection, with and without trailing slash
        .route("/api/repos", get(list_repos).post(register_repo))
        .route("/api/repos/", get(list_repos).post(register_repo))
        // Single repository; the link may itself contain slashes
        .route("/api/repos/{*link}", get(get_repo).delete(delete_repo))
        .with_state(state)
}

/// Creates a router with the given application state.
pub fn create_router(state: AppState) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(RequestIdLayer)
        .layer(LoggingLayer);

    api_router(state).layer(middleware_stack)
}

/// Creates a router with the given application state and metrics handle.
pub fn create_router_with_metrics(state: AppState, prometheus_handle: PrometheusHandle) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(RequestIdLayer)
        .layer(LoggingLayer);

    // Router for metrics endpoint (different state)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    Router::new()
        .merge(api_router(state))
        .merge(metrics_router)
        .layer(middleware::from_fn(
            crate::metrics::http::http_metrics_middleware,
        ))
        .layer(middleware_stack)
}

/// Allows cross-origin access to every route.
pub fn with_cors(router: Router) -> Router {
    router.layer(CorsLayer::permissive())
}

/// Serves `app` until SIGINT or SIGTERM, then drains in-flight requests for
/// at most `grace`.
pub async fn run_server(addr: SocketAddr, app: Router, grace: Duration) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    serve_with_shutdown(listener, app, shutdown_signal(), grace).await
}

/// Serves `app` on `listener` until `signal` resolves.
///
/// Requests still running `grace` after the signal are abandoned.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    grace: Duration,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (fired_tx, mut fired_rx) = watch::channel(false);

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        signal.await;
        let _ = fired_tx.send(true);
    });

    let deadline = async move {
        if fired_rx.wait_for(|fired| *fired).await.is_err() {
            // Server stopped without a signal.
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = serve.into_future() => result,
        () = deadline => {
            tracing::warn!("Requests still running after {:?}, abandoning them", grace);
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
