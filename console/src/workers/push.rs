//! Push channel worker
//!
//! Keeps a best-effort event stream open to the backend. Closes are retried
//! with a linear backoff until the retry budget is spent; after that only an
//! explicit [`PushHandle::connect`] brings the channel back.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::models::event::ProgressEvent;
use crate::models::notice::Notice;
use crate::push::channel::{ChannelConnector, ChannelStream, Frame};
use crate::push::lifecycle::{ConnectionLifecycle, ConnectionState};
use crate::sync::board::Update;
use crate::sync::synchronizer::SyncHandle;
use crate::utils::BackoffOptions;

/// Push worker options
#[derive(Debug, Clone)]
pub struct Options {
    pub backoff: BackoffOptions,

    /// Open the channel as soon as the worker starts
    pub connect_on_start: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            backoff: BackoffOptions::default(),
            connect_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelCommand {
    Connect,
    Disconnect,
}

/// Control surface of the push worker
#[derive(Clone)]
pub struct PushHandle {
    tx: mpsc::UnboundedSender<ChannelCommand>,
    state_rx: watch::Receiver<ConnectionState>,
}

/// Receiving end of a [`PushHandle`], consumed by [`run`]
pub struct PushControl {
    rx: mpsc::UnboundedReceiver<ChannelCommand>,
    state_tx: watch::Sender<ConnectionState>,
}

pub fn control() -> (PushHandle, PushControl) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    (PushHandle { tx, state_rx }, PushControl { rx, state_tx })
}

impl PushHandle {
    /// Ask for a connection. Ignored while connecting or connected;
    /// otherwise starts a fresh retry episode.
    pub fn connect(&self) {
        if self.tx.send(ChannelCommand::Connect).is_err() {
            warn!("Push worker has stopped, ignoring connect request");
        }
    }

    /// Close the channel without scheduling a reconnect
    pub fn disconnect(&self) {
        if self.tx.send(ChannelCommand::Disconnect).is_err() {
            warn!("Push worker has stopped, ignoring disconnect request");
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch connection state changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}

/// How a live session ended
enum SessionEnd {
    Closed,
    Disconnected,
    Shutdown,
}

/// Run the push worker
pub async fn run<C, S, F>(
    options: &Options,
    connector: &C,
    url: Url,
    sync: SyncHandle,
    control: PushControl,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    C: ChannelConnector + ?Sized,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Push worker starting...");

    let PushControl { mut rx, state_tx } = control;
    let mut lifecycle = ConnectionLifecycle::new(options.backoff.clone());
    let mut want_connect = options.connect_on_start;
    let mut retry_delay: Option<Duration> = None;

    loop {
        if want_connect && lifecycle.begin_connect() {
            publish(&state_tx, &lifecycle);
            info!("Connecting to event stream: {}", url);

            match connector.open(&url).await {
                Ok(mut stream) => {
                    lifecycle.on_open();
                    publish(&state_tx, &lifecycle);
                    info!("Event stream connected");
                    sync.notify(Notice::success("Live progress connected"));

                    let end = pump(
                        stream.as_mut(),
                        &sync,
                        &mut lifecycle,
                        &mut rx,
                        &mut shutdown_signal,
                    )
                    .await;
                    match end {
                        SessionEnd::Closed => {
                            warn!("Event stream closed");
                        }
                        SessionEnd::Disconnected => {
                            lifecycle.on_manual_close();
                            publish(&state_tx, &lifecycle);
                            want_connect = false;
                            retry_delay = None;
                            info!("Event stream disconnected on request");
                            continue;
                        }
                        SessionEnd::Shutdown => {
                            stream.close().await;
                            lifecycle.on_manual_close();
                            publish(&state_tx, &lifecycle);
                            info!("Push worker shutting down...");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to open event stream: {}", e);
                }
            }

            retry_delay = lifecycle.on_close();
            publish(&state_tx, &lifecycle);
            match retry_delay {
                Some(delay) => info!(
                    "Reconnecting in {:?} ({}/{})",
                    delay,
                    lifecycle.retry_count(),
                    lifecycle.max_attempts()
                ),
                None => info!("Reconnect attempts exhausted, waiting for a connect request"),
            }
        }
        want_connect = false;

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Push worker shutting down...");
                return;
            }
            command = rx.recv() => {
                match command {
                    Some(ChannelCommand::Connect) => {
                        debug!("Connect requested");
                        lifecycle.reset_retries();
                        retry_delay = None;
                        want_connect = true;
                    }
                    Some(ChannelCommand::Disconnect) => {
                        debug!("Disconnect requested while not connected");
                        retry_delay = None;
                    }
                    None => {
                        info!("Push worker control dropped, stopping");
                        return;
                    }
                }
            }
            _ = wait_retry(retry_delay, &sleep_fn) => {
                retry_delay = None;
                want_connect = true;
            }
        }
    }
}

async fn pump(
    stream: &mut dyn ChannelStream,
    sync: &SyncHandle,
    lifecycle: &mut ConnectionLifecycle,
    rx: &mut mpsc::UnboundedReceiver<ChannelCommand>,
    shutdown_signal: &mut Pin<Box<dyn Future<Output = ()> + Send>>,
) -> SessionEnd {
    loop {
        tokio::select! {
            _ = &mut *shutdown_signal => return SessionEnd::Shutdown,
            command = rx.recv() => {
                match command {
                    Some(ChannelCommand::Connect) => {
                        debug!("Already connected, ignoring connect request");
                    }
                    Some(ChannelCommand::Disconnect) => {
                        stream.close().await;
                        return SessionEnd::Disconnected;
                    }
                    None => return SessionEnd::Shutdown,
                }
            }
            frame = stream.next_frame() => {
                match frame {
                    Frame::Text(text) => handle_message(&text, sync),
                    Frame::Error(e) => {
                        warn!("Event stream error: {}", e);
                        lifecycle.on_error();
                    }
                    Frame::Closed => return SessionEnd::Closed,
                }
            }
        }
    }
}

/// Sleep until the scheduled retry; never resolves when none is scheduled
async fn wait_retry<S, F>(delay: Option<Duration>, sleep_fn: &S)
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    match delay {
        Some(delay) => sleep_fn(delay).await,
        None => std::future::pending::<()>().await,
    }
}

fn handle_message(text: &str, sync: &SyncHandle) {
    match ProgressEvent::parse(text) {
        Ok(event) => {
            debug!("Progress event: {:?}", event);
            sync.apply(Update::Push(event));
        }
        Err(e) => {
            error!("Dropping malformed progress event: {}", e);
        }
    }
}

fn publish(state_tx: &watch::Sender<ConnectionState>, lifecycle: &ConnectionLifecycle) {
    state_tx.send_replace(lifecycle.state());
}
