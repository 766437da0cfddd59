//! Deployment target endpoints (read-only)

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::models::target::{Target, TargetListResponse};

impl HttpClient {
    /// List every configured target
    pub async fn get_targets(&self) -> Result<Vec<Target>, ConsoleError> {
        let response: TargetListResponse = self.get("/api/multi-deploy/servers").await?;
        Ok(response.servers)
    }

    /// Ask the backend to test its SSH connection to a target
    pub async fn check_connection(&self, target_id: &str) -> Result<String, ConsoleError> {
        let path = format!("/api/multi-deploy/test/{}", target_id);
        let reply = self.post_empty(&path).await?;
        match reply.error {
            Some(error) => Err(ConsoleError::ActionFailed {
                action: "test".to_string(),
                reason: error,
            }),
            None => Ok(reply.message.unwrap_or_else(|| "Connection OK".to_string())),
        }
    }
}
