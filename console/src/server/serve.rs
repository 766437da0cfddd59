//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::ConsoleError;
use crate::server::handlers::{
    action_handler, build_handler, clear_logs_handler, connect_handler, deploy_all_handler,
    disconnect_handler, health_handler, logs_handler, serve_handler, serve_status_handler,
    statuses_handler, targets_handler, test_target_handler, version_handler,
};
use crate::server::state::ServerState;

/// Build the console router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Targets and rows
        .route("/targets", get(targets_handler))
        .route("/targets/{target_id}/test", post(test_target_handler))
        .route("/statuses", get(statuses_handler))
        // Log feed
        .route("/logs", get(logs_handler).delete(clear_logs_handler))
        // Deploy controls
        .route("/build", post(build_handler))
        .route("/deploy-all", post(deploy_all_handler))
        .route("/actions/{action}/{target_id}", post(action_handler))
        // Preview server
        .route("/serve/status", get(serve_status_handler))
        .route("/serve/{command}", post(serve_handler))
        // Push channel
        .route("/connect", post(connect_handler))
        .route("/disconnect", post(disconnect_handler))
        // State and middleware
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), ConsoleError>>, ConsoleError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting console server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ConsoleError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ConsoleError::ServerError(e.to_string()))
    });

    Ok(handle)
}
