//! HTTP client implementation

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error};

use crate::errors::ConsoleError;
use crate::models::serve::ServeStatus;

/// Generic `{message}` / `{error}` reply of the backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiReply {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub error: Option<String>,

    /// Captured tool output, sent by build endpoints
    #[serde(default)]
    pub output: Option<String>,

    #[serde(default)]
    pub stderr: Option<String>,

    /// Preview server state, sent by serve endpoints
    #[serde(default)]
    pub status: Option<ServeStatus>,
}

/// HTTP client for backend communication
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConsoleError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hugodeck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let response = ensure_success("GET", response).await?;

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a body-less POST and read the backend's reply.
    ///
    /// The reply is returned even for error statuses so callers can surface
    /// the backend's own `error` text.
    pub async fn post_empty(&self, path: &str) -> Result<ApiReply, ConsoleError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).send().await?;
        read_reply(response).await
    }

    /// POST a JSON body and read the backend's reply
    pub async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiReply, ConsoleError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        read_reply(response).await
    }
}

async fn read_reply(response: Response) -> Result<ApiReply, ConsoleError> {
    let status = response.status();
    let text = response.text().await?;

    match serde_json::from_str::<ApiReply>(&text) {
        Ok(reply) if reply.error.is_some() || status.is_success() => Ok(reply),
        _ => {
            error!("HTTP POST failed: {} - {}", status, text);
            Err(ConsoleError::BackendError(format!("{}: {}", status, text)))
        }
    }
}

async fn ensure_success(method: &str, response: Response) -> Result<Response, ConsoleError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("HTTP {} failed: {} - {}", method, status, body);

    let reason = serde_json::from_str::<ApiReply>(&body)
        .ok()
        .and_then(|reply| reply.error)
        .unwrap_or(body);
    Err(ConsoleError::BackendError(format!("{}: {}", status, reason)))
}
