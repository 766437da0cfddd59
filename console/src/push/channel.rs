//! Event stream transport

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, protocol::Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use crate::errors::ConsoleError;

const PROGRESS_PATH: &str = "/ws/progress";

/// What the transport delivered next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// A transport error; a close may or may not follow
    Error(String),
    Closed,
}

#[async_trait]
pub trait ChannelStream: Send {
    async fn next_frame(&mut self) -> Frame;

    async fn close(&mut self);
}

/// Opens push channels
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn open(&self, url: &Url) -> Result<Box<dyn ChannelStream>, ConsoleError>;
}

/// Derive the progress stream URL from the backend base URL. A secure
/// backend maps to a secure channel.
pub fn build_progress_url(backend_url: &str) -> Result<Url, ConsoleError> {
    let mut url = Url::parse(backend_url).map_err(|e| ConsoleError::ConfigError(e.to_string()))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ConsoleError::ConfigError(format!(
                "Unsupported backend URL scheme: {}",
                other
            )))
        }
    };

    url.set_scheme(scheme)
        .map_err(|_| ConsoleError::ConfigError("Failed to set scheme".to_string()))?;
    url.set_path(PROGRESS_PATH);
    url.set_query(None);

    Ok(url)
}

/// WebSocket transport
pub struct WsConnector {
    user_agent: String,
}

impl WsConnector {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl ChannelConnector for WsConnector {
    async fn open(&self, url: &Url) -> Result<Box<dyn ChannelStream>, ConsoleError> {
        let host = url
            .host_str()
            .ok_or_else(|| ConsoleError::ConfigError(format!("No host in {}", url)))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let request = http::Request::builder()
            .uri(url.as_str())
            .header("Host", host)
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Sec-WebSocket-Version", "13")
            .header(
                "Sec-WebSocket-Key",
                tungstenite::handshake::client::generate_key(),
            )
            .header("User-Agent", &self.user_agent)
            .body(())
            .map_err(|e| ConsoleError::ChannelError(e.to_string()))?;

        let (stream, _) = connect_async(request).await?;
        Ok(Box::new(WsStream { inner: stream }))
    }
}

struct WsStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl ChannelStream for WsStream {
    async fn next_frame(&mut self) -> Frame {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Frame::Text(text.as_str().to_string()),
                Some(Ok(Message::Close(_))) | None => return Frame::Closed,
                Some(Ok(other)) => {
                    debug!("Ignoring non-text frame: {:?}", other);
                }
                Some(Err(
                    tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed,
                )) => return Frame::Closed,
                Some(Err(e)) => return Frame::Error(e.to_string()),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.inner.close(None).await;
    }
}
