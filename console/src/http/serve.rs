//! Hugo preview server endpoints

use serde::Serialize;

use crate::deploy::action::ServeCommand;
use crate::errors::ConsoleError;
use crate::http::actions::{ServeFailure, ServeReport};
use crate::http::client::{ApiReply, HttpClient};
use crate::models::serve::{ServeStatus, ServeStatusResponse};

#[derive(Debug, Serialize)]
struct StartServeRequest {
    port: u16,
}

impl HttpClient {
    /// Start, stop or restart `hugo serve` on the backend
    pub async fn send_serve_command(
        &self,
        command: ServeCommand,
        port: u16,
    ) -> Result<ServeReport, ServeFailure> {
        let path = format!("/api/hugo-serve/{}", command.as_path());
        let reply = match command {
            ServeCommand::Start => self.post_json(&path, &StartServeRequest { port }).await,
            ServeCommand::Stop | ServeCommand::Restart => self.post_empty(&path).await,
        };
        let reply = reply.map_err(|e| ServeFailure {
            error: e.to_string(),
            ..Default::default()
        })?;
        serve_outcome(command, reply)
    }

    /// Current state of `hugo serve`
    pub async fn get_serve_status(&self) -> Result<ServeStatus, ConsoleError> {
        let response: ServeStatusResponse = self.get("/api/hugo-serve/status").await?;
        Ok(response.status)
    }
}

fn serve_outcome(command: ServeCommand, reply: ApiReply) -> Result<ServeReport, ServeFailure> {
    match reply.error {
        Some(error) => Err(ServeFailure {
            error,
            stderr: reply.stderr.unwrap_or_default(),
            output: reply.output.unwrap_or_default(),
        }),
        None => Ok(ServeReport {
            message: reply
                .message
                .unwrap_or_else(|| command.done_message().to_string()),
            status: reply.status.unwrap_or_default(),
        }),
    }
}
