//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::deploy::action::{DeployAction, ServeCommand};
use crate::deploy::dispatcher::BatchReport;
use crate::deploy::gate::BuildState;
use crate::errors::ConsoleError;
use crate::http::actions::{BuildReport, ServeReport};
use crate::models::log_entry::LogEntry;
use crate::models::serve::{ServeStatus, DEFAULT_SERVE_PORT};
use crate::models::target::Target;
use crate::push::lifecycle::ConnectionState;
use crate::render::view::RowView;
use crate::server::state::ServerState;
use crate::utils::{version_info, VersionInfo};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = match &self {
            ConsoleError::NotFound(_) => StatusCode::NOT_FOUND,
            ConsoleError::DeployBlocked(_) | ConsoleError::Busy(_) => StatusCode::CONFLICT,
            ConsoleError::ActionFailed { .. }
            | ConsoleError::BuildFailed(_)
            | ConsoleError::ServeFailed(_)
            | ConsoleError::BackendError(_)
            | ConsoleError::HttpError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "hugodeck".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> Json<VersionInfo> {
    Json(version_info())
}

/// A target joined with its current row, if any
#[derive(Debug, Serialize)]
pub struct TargetRow {
    #[serde(flatten)]
    pub target: Target,
    pub endpoint: String,
    pub row: Option<RowView>,
}

/// Targets handler
pub async fn targets_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<Vec<TargetRow>>, ConsoleError> {
    let targets = state.dispatcher.backend().list_targets().await?;
    let records = state.sync.statuses().await?;

    let rows = targets
        .into_iter()
        .map(|target| {
            let row = records
                .get(&target.id)
                .map(|record| RowView::build(&target.id, record));
            TargetRow {
                endpoint: target.endpoint(),
                target,
                row,
            }
        })
        .collect();
    Ok(Json(rows))
}

/// Console state response
#[derive(Debug, Serialize)]
pub struct StatusesResponse {
    pub connection: ConnectionState,
    pub build: BuildState,
    pub deploy_enabled: bool,
    pub rows: Vec<RowView>,
}

/// Statuses handler
pub async fn statuses_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<StatusesResponse>, ConsoleError> {
    let records = state.sync.statuses().await?;
    let rows = records
        .iter()
        .map(|(target_id, record)| RowView::build(target_id, record))
        .collect();

    Ok(Json(StatusesResponse {
        connection: state.push.state(),
        build: state.dispatcher.build_state(),
        deploy_enabled: state.dispatcher.deploy_enabled(),
        rows,
    }))
}

/// Logs handler
pub async fn logs_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<Vec<LogEntry>>, ConsoleError> {
    Ok(Json(state.sync.logs().await?))
}

/// Clear logs handler
pub async fn clear_logs_handler(State(state): State<Arc<ServerState>>) -> StatusCode {
    state.sync.clear_log();
    StatusCode::NO_CONTENT
}

/// Build handler
pub async fn build_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<BuildReport>, ConsoleError> {
    Ok(Json(state.dispatcher.build().await?))
}

#[derive(Debug, Deserialize)]
pub struct ServeQuery {
    #[serde(default = "default_serve_port")]
    pub port: u16,
}

fn default_serve_port() -> u16 {
    DEFAULT_SERVE_PORT
}

/// Preview server control handler
pub async fn serve_handler(
    State(state): State<Arc<ServerState>>,
    Path(command): Path<String>,
    Query(query): Query<ServeQuery>,
) -> Result<Json<ServeReport>, ConsoleError> {
    let command: ServeCommand = command.parse()?;
    Ok(Json(state.dispatcher.serve(command, query.port).await?))
}

/// Preview server status handler
pub async fn serve_status_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ServeStatus>, ConsoleError> {
    Ok(Json(state.dispatcher.serve_status().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeployAllQuery {
    #[serde(default)]
    pub incremental: bool,
}

/// Batch deploy handler
pub async fn deploy_all_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<DeployAllQuery>,
) -> Result<Json<BatchReport>, ConsoleError> {
    Ok(Json(state.dispatcher.deploy_all(query.incremental).await?))
}

/// Action response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Per-target action handler
pub async fn action_handler(
    State(state): State<Arc<ServerState>>,
    Path((action, target_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ConsoleError> {
    let action: DeployAction = action.parse()?;
    debug!("Action {} requested for {}", action, target_id);

    let message = state.dispatcher.trigger(action, &target_id).await?;
    Ok(Json(MessageResponse { message }))
}

/// Connection test handler
pub async fn test_target_handler(
    State(state): State<Arc<ServerState>>,
    Path(target_id): Path<String>,
) -> Result<Json<MessageResponse>, ConsoleError> {
    let message = state.dispatcher.backend().test_connection(&target_id).await?;
    Ok(Json(MessageResponse { message }))
}

/// Connection response
#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub connection: ConnectionState,
}

/// Push channel connect handler
pub async fn connect_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.push.connect();
    (
        StatusCode::ACCEPTED,
        Json(ConnectionResponse {
            connection: state.push.state(),
        }),
    )
}

/// Push channel disconnect handler
pub async fn disconnect_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.push.disconnect();
    (
        StatusCode::ACCEPTED,
        Json(ConnectionResponse {
            connection: state.push.state(),
        }),
    )
}
