//! Deploy action and build endpoints

use async_trait::async_trait;
use serde::Serialize;

use crate::deploy::action::{DeployAction, ServeCommand};
use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::models::serve::ServeStatus;
use crate::models::target::Target;

/// Result of a site build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub message: String,
    pub output: String,
}

/// Build failure with whatever output the build produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    pub error: String,
    pub output: String,
}

/// Accepted `hugo serve` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServeReport {
    pub message: String,
    pub status: ServeStatus,
}

/// Rejected `hugo serve` command with the process output, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeFailure {
    pub error: String,
    pub stderr: String,
    pub output: String,
}

/// Backend operations behind the deploy controls, for testability
#[async_trait]
pub trait DeployBackend: Send + Sync {
    async fn list_targets(&self) -> Result<Vec<Target>, ConsoleError>;

    /// Fire an action at a target; returns the backend's message
    async fn trigger_action(
        &self,
        action: DeployAction,
        target_id: &str,
    ) -> Result<String, ConsoleError>;

    async fn build_site(&self) -> Result<BuildReport, BuildFailure>;

    async fn test_connection(&self, target_id: &str) -> Result<String, ConsoleError>;

    async fn start_serve(&self, port: u16) -> Result<ServeReport, ServeFailure>;

    async fn stop_serve(&self) -> Result<ServeReport, ServeFailure>;

    async fn restart_serve(&self) -> Result<ServeReport, ServeFailure>;

    async fn serve_status(&self) -> Result<ServeStatus, ConsoleError>;
}

#[async_trait]
impl DeployBackend for HttpClient {
    async fn list_targets(&self) -> Result<Vec<Target>, ConsoleError> {
        self.get_targets().await
    }

    async fn trigger_action(
        &self,
        action: DeployAction,
        target_id: &str,
    ) -> Result<String, ConsoleError> {
        let path = format!("/api/multi-deploy/{}/{}", action.as_path(), target_id);
        let failed = |reason: String| ConsoleError::ActionFailed {
            action: action.as_path().to_string(),
            reason,
        };

        let reply = self.post_empty(&path).await.map_err(|e| failed(e.to_string()))?;
        match reply.error {
            Some(error) => Err(failed(error)),
            None => Ok(reply
                .message
                .unwrap_or_else(|| action.pending_message().to_string())),
        }
    }

    async fn build_site(&self) -> Result<BuildReport, BuildFailure> {
        let reply = self.post_empty("/api/build-hugo").await.map_err(|e| BuildFailure {
            error: e.to_string(),
            output: String::new(),
        })?;

        let output = reply.output.unwrap_or_default();
        match reply.error {
            Some(error) => Err(BuildFailure { error, output }),
            None => Ok(BuildReport {
                message: reply.message.unwrap_or_else(|| "Build succeeded".to_string()),
                output,
            }),
        }
    }

    async fn test_connection(&self, target_id: &str) -> Result<String, ConsoleError> {
        self.check_connection(target_id).await
    }

    async fn start_serve(&self, port: u16) -> Result<ServeReport, ServeFailure> {
        self.send_serve_command(ServeCommand::Start, port).await
    }

    async fn stop_serve(&self) -> Result<ServeReport, ServeFailure> {
        self.send_serve_command(ServeCommand::Stop, 0).await
    }

    async fn restart_serve(&self) -> Result<ServeReport, ServeFailure> {
        self.send_serve_command(ServeCommand::Restart, 0).await
    }

    async fn serve_status(&self) -> Result<ServeStatus, ConsoleError> {
        self.get_serve_status().await
    }
}
