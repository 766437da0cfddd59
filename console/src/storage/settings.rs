//! Settings file management

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::ConsoleError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Also write a daily rolling log file
    #[serde(default)]
    pub log_to_file: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Push channel reconnect policy
    #[serde(default)]
    pub reconnect: ReconnectSettings,

    /// Status poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum persisted journal entries
    #[serde(default = "default_log_retention")]
    pub log_retention: usize,

    /// Enable the push channel
    #[serde(default = "default_true")]
    pub enable_push: bool,

    /// Enable the status poller
    #[serde(default = "default_true")]
    pub enable_poller: bool,

    /// Enable the local console HTTP server
    #[serde(default = "default_true")]
    pub enable_console_server: bool,

    /// Local console HTTP server
    #[serde(default)]
    pub console_server: ConsoleServerSettings,

    /// Print rows and notices to the terminal
    #[serde(default = "default_true")]
    pub render_terminal: bool,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_log_retention() -> usize {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            log_to_file: false,
            backend: BackendSettings::default(),
            reconnect: ReconnectSettings::default(),
            poll_interval_ms: default_poll_interval_ms(),
            log_retention: default_log_retention(),
            enable_push: true,
            enable_poller: true,
            enable_console_server: true,
            console_server: ConsoleServerSettings::default(),
            render_terminal: true,
        }
    }
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the content management backend
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Reconnect policy for the push channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectSettings {
    /// Delay unit in milliseconds; attempt `n` waits `n` units
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Attempts per disconnection episode
    #[serde(default = "default_reconnect_max_attempts")]
    pub max_attempts: u32,
}

fn default_reconnect_base_delay_ms() -> u64 {
    2000
}

fn default_reconnect_max_attempts() -> u32 {
    5
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            base_delay_ms: default_reconnect_base_delay_ms(),
            max_attempts: default_reconnect_max_attempts(),
        }
    }
}

/// Local console server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleServerSettings {
    #[serde(default = "default_console_host")]
    pub host: String,

    #[serde(default = "default_console_port")]
    pub port: u16,
}

fn default_console_host() -> String {
    "127.0.0.1".to_string()
}

fn default_console_port() -> u16 {
    7070
}

impl Default for ConsoleServerSettings {
    fn default() -> Self {
        Self {
            host: default_console_host(),
            port: default_console_port(),
        }
    }
}

/// Load the settings file, writing the defaults when it does not exist yet
pub async fn load_or_init(file: &File) -> Result<Settings, ConsoleError> {
    if file.exists().await {
        return file.read_json::<Settings>().await;
    }

    let settings = Settings::default();
    info!("No settings at {}, writing defaults", file.path().display());
    if let Err(e) = file.write_json(&settings).await {
        warn!("Unable to write default settings: {}", e);
    }
    Ok(settings)
}
