//! Per-target deployment status

use serde::{Deserialize, Serialize};

/// Deployment status reported by the backend.
///
/// Unrecognized strings are kept verbatim in [`DeployStatus::Other`] so newer
/// backends can add states without breaking the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeployStatus {
    #[default]
    Idle,
    Building,
    Deploying,
    Success,
    Failed,
    Paused,
    Other(String),
}

impl DeployStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "idle" => DeployStatus::Idle,
            "building" => DeployStatus::Building,
            "deploying" => DeployStatus::Deploying,
            "success" => DeployStatus::Success,
            "failed" => DeployStatus::Failed,
            "paused" => DeployStatus::Paused,
            other => DeployStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeployStatus::Idle => "idle",
            DeployStatus::Building => "building",
            DeployStatus::Deploying => "deploying",
            DeployStatus::Success => "success",
            DeployStatus::Failed => "failed",
            DeployStatus::Paused => "paused",
            DeployStatus::Other(s) => s,
        }
    }

    /// Display label; unknown statuses are shown as-is
    pub fn label(&self) -> &str {
        match self {
            DeployStatus::Idle => "Idle",
            DeployStatus::Building => "Building",
            DeployStatus::Deploying => "Deploying",
            DeployStatus::Success => "Succeeded",
            DeployStatus::Failed => "Failed",
            DeployStatus::Paused => "Paused",
            DeployStatus::Other(s) => s,
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            DeployStatus::Success => StatusColor::Success,
            DeployStatus::Failed => StatusColor::Danger,
            DeployStatus::Building | DeployStatus::Paused => StatusColor::Warning,
            DeployStatus::Deploying => StatusColor::Info,
            DeployStatus::Idle | DeployStatus::Other(_) => StatusColor::Secondary,
        }
    }

    /// Whether progress numbers mean anything for this status
    pub fn is_in_flight(&self) -> bool {
        matches!(self, DeployStatus::Building | DeployStatus::Deploying)
    }
}

impl std::fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeployStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeployStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(DeployStatus::parse(&s))
    }
}

/// Color class of a status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Success,
    Danger,
    Warning,
    Info,
    Secondary,
}

/// Authoritative state of one target.
///
/// Always replaced as a whole, never patched field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(default)]
    pub status: DeployStatus,

    #[serde(default)]
    pub message: String,

    /// Percentage, only meaningful while building or deploying
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

    #[serde(default)]
    pub can_pause: bool,

    #[serde(default)]
    pub can_resume: bool,

    #[serde(default)]
    pub can_stop: bool,
}
