//! Deployment targets

use serde::{Deserialize, Serialize};

/// A configured deployment destination.
///
/// Targets are managed by the backend; the console only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,

    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub remote_path: String,
}

fn default_true() -> bool {
    true
}

impl Target {
    /// `user@host:port`, as shown in the target list
    pub fn endpoint(&self) -> String {
        match (self.username.is_empty(), self.port) {
            (true, 0) => self.host.clone(),
            (true, port) => format!("{}:{}", self.host, port),
            (false, 0) => format!("{}@{}", self.username, self.host),
            (false, port) => format!("{}@{}:{}", self.username, self.host, port),
        }
    }
}

/// Target list response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetListResponse {
    #[serde(default)]
    pub servers: Vec<Target>,
}
