//! Application configuration options

use std::time::Duration;

use crate::journal::store::DEFAULT_RETENTION;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::utils::BackoffOptions;
use crate::workers::{poller, push};

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Backend API base URL
    pub backend_base_url: String,

    /// Timeout for backend requests
    pub request_timeout: Duration,

    /// Storage configuration
    pub storage: StorageOptions,

    /// Enable the push channel worker
    pub enable_push: bool,

    /// Enable polling worker
    pub enable_poller: bool,

    /// Enable the local console server
    pub enable_console_server: bool,

    /// Print rows, logs and notices to stdout
    pub render_terminal: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Push worker options
    pub push: push::Options,

    /// Poller worker options
    pub poller: poller::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            backend_base_url: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_secs(30),
            storage: StorageOptions::default(),
            enable_push: true,
            enable_poller: true,
            enable_console_server: true,
            render_terminal: true,
            server: ServerOptions::default(),
            push: push::Options::default(),
            poller: poller::Options::default(),
        }
    }
}

impl AppOptions {
    /// Build options from the settings file
    pub fn from_settings(settings: &Settings, layout: StorageLayout) -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            backend_base_url: settings.backend.base_url.clone(),
            request_timeout: Duration::from_secs(settings.backend.request_timeout_secs),
            storage: StorageOptions {
                layout,
                log_retention: settings.log_retention,
            },
            enable_push: settings.enable_push,
            enable_poller: settings.enable_poller,
            enable_console_server: settings.enable_console_server,
            render_terminal: settings.render_terminal,
            server: ServerOptions {
                host: settings.console_server.host.clone(),
                port: settings.console_server.port,
            },
            push: push::Options {
                backoff: BackoffOptions {
                    base_delay: Duration::from_millis(settings.reconnect.base_delay_ms),
                    max_attempts: settings.reconnect.max_attempts,
                },
                ..Default::default()
            },
            poller: poller::Options {
                interval: Duration::from_millis(settings.poll_interval_ms),
                ..Default::default()
            },
        }
    }
}

/// Lifecycle options for the console
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(10),
        }
    }
}

/// Storage configuration options
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Storage layout paths
    pub layout: StorageLayout,

    /// Maximum persisted journal entries
    pub log_retention: usize,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            layout: StorageLayout::default(),
            log_retention: DEFAULT_RETENTION,
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}
