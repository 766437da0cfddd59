//! Status poll endpoint

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::models::status::StatusRecord;
use crate::sync::board::StatusesResponse;

/// Source of full status snapshots, for testability
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_statuses(&self) -> Result<HashMap<String, StatusRecord>, ConsoleError>;
}

#[async_trait]
impl StatusSource for HttpClient {
    async fn fetch_statuses(&self) -> Result<HashMap<String, StatusRecord>, ConsoleError> {
        let response: StatusesResponse = self.get("/api/multi-deploy/statuses").await?;
        Ok(response.statuses)
    }
}
