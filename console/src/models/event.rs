//! Progress events pushed over the event stream

use serde::{Deserialize, Serialize};

use crate::models::log_entry::LogKind;
use crate::models::status::{DeployStatus, StatusRecord};

/// A progress event as broadcast by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,

    /// Event family: "build", "deploy", "complete", "error"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub status: DeployStatus,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub progress: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}

impl ProgressEvent {
    /// Parse a raw frame from the event stream
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Target this event belongs to. The backend sends an empty id for
    /// system-wide events.
    pub fn target_id(&self) -> Option<&str> {
        self.server_id.as_deref().filter(|id| !id.is_empty())
    }

    /// The full record this event stands for
    pub fn to_record(&self) -> StatusRecord {
        StatusRecord {
            status: self.status.clone(),
            message: self.message.clone(),
            progress: self.progress,
            current_file: self.current_file.clone(),
            current: self.current,
            total: self.total,
            speed: self.speed.clone(),
            can_pause: false,
            can_resume: false,
            can_stop: false,
        }
    }

    /// Log line for the deployment journal
    pub fn log_line(&self) -> (String, LogKind) {
        let source = self
            .server_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("system");
        let kind = match self.status {
            DeployStatus::Failed => LogKind::Error,
            DeployStatus::Success => LogKind::Success,
            _ => LogKind::Info,
        };
        (format!("[{}] {}", source, self.message), kind)
    }
}
