//! Deployment journal entries

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a journal entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Success => "success",
            LogKind::Warning => "warning",
            LogKind::Error => "error",
        }
    }
}

impl std::str::FromStr for LogKind {
    type Err = std::convert::Infallible;

    /// Unknown kinds fall back to `Info`, the way they are displayed
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "success" => LogKind::Success,
            "warning" => LogKind::Warning,
            "error" => LogKind::Error,
            _ => LogKind::Info,
        })
    }
}

impl Serialize for LogKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or_default())
    }
}

/// One line of the deployment journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Local wall-clock time, as displayed
    pub timestamp: String,

    pub message: String,

    #[serde(rename = "type", default)]
    pub kind: LogKind,

    pub date: DateTime<Utc>,
}

impl LogEntry {
    pub fn now(message: impl Into<String>, kind: LogKind) -> Self {
        let date = Utc::now();
        Self {
            timestamp: date.with_timezone(&Local).format("%H:%M:%S").to_string(),
            message: message.into(),
            kind,
            date,
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.message)
    }
}
