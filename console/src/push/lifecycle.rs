//! Push channel connection lifecycle

use std::time::Duration;

use serde::Serialize;

use crate::utils::{calc_linear_backoff, BackoffOptions};

/// Connection state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Connection state machine with a bounded, linearly backing-off retry
/// counter. The counter belongs to one disconnection episode: it resets on
/// every successful open and on every external connect request.
#[derive(Debug, Clone)]
pub struct ConnectionLifecycle {
    state: ConnectionState,
    retry_count: u32,
    backoff: BackoffOptions,
}

impl ConnectionLifecycle {
    pub fn new(backoff: BackoffOptions) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            retry_count: 0,
            backoff,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn max_attempts(&self) -> u32 {
        self.backoff.max_attempts
    }

    /// Whether the retry budget of the current episode is spent
    pub fn is_exhausted(&self) -> bool {
        self.state == ConnectionState::Disconnected && self.retry_count >= self.backoff.max_attempts
    }

    /// Start connecting. Returns `false`, changing nothing, when a
    /// connection is already open or being opened.
    pub fn begin_connect(&mut self) -> bool {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => false,
            ConnectionState::Disconnected => {
                self.state = ConnectionState::Connecting;
                true
            }
        }
    }

    pub fn on_open(&mut self) {
        self.state = ConnectionState::Connected;
        self.retry_count = 0;
    }

    /// Transport errors do not change state; the close that usually
    /// follows does.
    pub fn on_error(&mut self) {}

    /// The channel closed, or failed to open. Returns the delay before the
    /// next attempt, or `None` once the retry budget is spent.
    pub fn on_close(&mut self) -> Option<Duration> {
        self.state = ConnectionState::Disconnected;
        if self.retry_count < self.backoff.max_attempts {
            self.retry_count += 1;
            Some(calc_linear_backoff(&self.backoff, self.retry_count))
        } else {
            None
        }
    }

    /// The operator closed the channel; no retry is scheduled
    pub fn on_manual_close(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// An external connect request opens a fresh episode
    pub fn reset_retries(&mut self) {
        self.retry_count = 0;
    }
}
