//! Application builder and server bootstrap.

use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::trace::TraceLayer;

use tagvault_core::config::AppConfig;
use tagvault_core::error::AppError;
use tagvault_core::result::AppResult;
use tagvault_database::CatalogStore;

use crate::middleware::compression::build_compression_layer;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(build_compression_layer())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(request_logging))
}

/// Build the state, bootstrap the root folder, and return the app.
///
/// With `worker.sync_on_startup`, one reconciliation of the root is
/// queued before the first request is served.
pub async fn bootstrap(
    config: AppConfig,
    store: Arc<dyn CatalogStore>,
) -> AppResult<(AppState, Router)> {
    tokio::fs::create_dir_all(&config.storage.staging_dir)
        .await
        .map_err(|e| {
            AppError::with_source(
                tagvault_core::error::ErrorKind::Storage,
                format!("Failed to create staging dir '{}'", config.storage.staging_dir),
                e,
            )
        })?;

    let state = AppState::build(config, store).await?;
    let root = state.folder_service.ensure_root().await?;
    tracing::info!(folder_id = %root.id, full_path = %root.full_path, "Root folder ready");

    if state.config.worker.sync_on_startup {
        state.reconciler.schedule(&root);
    }

    let app = build_app(state.clone());
    Ok((state, app))
}

/// Runs the TagVault server until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting TagVault server...");

    let store = tagvault_database::connect_store(&config.database).await?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let (state, app) = bootstrap(config, store).await?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("TagVault server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!(queue = ?state.queue.stats(), "Server stopped, waiting for background jobs");
    state.queue.wait_idle().await;
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
