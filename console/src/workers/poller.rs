//! Polling worker for periodic status reconciliation

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::http::statuses::StatusSource;
use crate::sync::board::Update;
use crate::sync::synchronizer::SyncHandle;

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,

    /// Initial delay before the first interval starts
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            initial_delay: Duration::ZERO,
        }
    }
}

/// Run the poller worker.
///
/// Polls regardless of push channel health; a failed poll is logged and the
/// next interval tries again.
pub async fn run<P, S, F>(
    options: &Options,
    source: &P,
    sync: &SyncHandle,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    P: StatusSource + ?Sized,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller worker starting...");

    if !options.initial_delay.is_zero() {
        sleep_fn(options.initial_delay).await;
    }

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }

        debug!("Polling deployment statuses...");

        match source.fetch_statuses().await {
            Ok(statuses) => {
                debug!("Polled {} status record(s)", statuses.len());
                sync.apply(Update::Poll(statuses));
            }
            Err(e) => {
                error!("Status poll failed: {}", e);
            }
        }
    }
}
