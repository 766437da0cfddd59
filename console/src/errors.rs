//! Error types for the deployment console

use thiserror::Error;

/// Main error type for the console
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Action {action} failed: {reason}")]
    ActionFailed { action: String, reason: String },

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Hugo serve failed: {0}")]
    ServeFailed(String),

    #[error("Deploy blocked: {0}")]
    DeployBlocked(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ConsoleError {
    fn from(err: anyhow::Error) -> Self {
        ConsoleError::Internal(err.to_string())
    }
}
