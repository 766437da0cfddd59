//! Hugo preview server state

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVE_PORT: u16 = 1313;

/// State of the backend's `hugo serve` process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServeStatus {
    #[serde(default)]
    pub running: bool,

    #[serde(default)]
    pub port: u16,

    /// Only present while running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

/// Serve status response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServeStatusResponse {
    #[serde(default)]
    pub status: ServeStatus,
}
