//! Row view model: what a target row looks like for a given record

use serde::Serialize;

use crate::models::status::{DeployStatus, StatusColor, StatusRecord};

/// Icon shown when a row has no progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusIcon {
    Check,
    Cross,
    Dash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RowBody {
    Progress {
        percent: u8,
        bar_color: StatusColor,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_file: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        files: Option<(u64, u64)>,
        #[serde(skip_serializing_if = "Option::is_none")]
        speed: Option<String>,
    },
    Icon {
        icon: StatusIcon,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub target_id: String,
    pub status: String,
    pub label: String,
    pub color: StatusColor,
    pub message: String,
    pub body: RowBody,
}

impl RowView {
    pub fn build(target_id: &str, record: &StatusRecord) -> Self {
        Self {
            target_id: target_id.to_string(),
            status: record.status.as_str().to_string(),
            label: record.status.label().to_string(),
            color: record.status.color(),
            message: record.message.clone(),
            body: build_body(record),
        }
    }

    pub fn progress(&self) -> Option<u8> {
        match self.body {
            RowBody::Progress { percent, .. } => Some(percent),
            RowBody::Icon { .. } => None,
        }
    }
}

fn build_body(record: &StatusRecord) -> RowBody {
    if !record.status.is_in_flight() {
        let icon = match record.status {
            DeployStatus::Success => StatusIcon::Check,
            DeployStatus::Failed => StatusIcon::Cross,
            _ => StatusIcon::Dash,
        };
        return RowBody::Icon { icon };
    }

    let bar_color = match record.status {
        DeployStatus::Building => StatusColor::Warning,
        _ => StatusColor::Info,
    };
    let files = match (record.current, record.total) {
        (Some(current), Some(total)) if current > 0 && total > 0 => Some((current, total)),
        _ => None,
    };

    RowBody::Progress {
        percent: record.progress.min(100) as u8,
        bar_color,
        current_file: non_empty(&record.current_file),
        files,
        speed: non_empty(&record.speed),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}
