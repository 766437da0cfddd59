//! Deployment status synchronizer
//!
//! One task owns the status board and the journal. Workers and request
//! handlers talk to it through a [`SyncHandle`]; commands are applied one at
//! a time in arrival order, so no record is ever observed half-written.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::errors::ConsoleError;
use crate::journal::store::Journal;
use crate::models::log_entry::{LogEntry, LogKind};
use crate::models::notice::Notice;
use crate::models::status::StatusRecord;
use crate::render::view::RowView;
use crate::render::Renderer;
use crate::sync::board::{RowUpdate, StatusBoard, Update};

const UPDATE_CHANNEL_CAPACITY: usize = 256;

enum Command {
    Apply(Update),
    Log(String, LogKind),
    Notice(Notice),
    ClearLog,
    Statuses(oneshot::Sender<BTreeMap<String, StatusRecord>>),
    Logs(oneshot::Sender<Vec<LogEntry>>),
}

/// Cloneable handle to a running [`Synchronizer`]
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<Command>,
    updates: broadcast::Sender<RowUpdate>,
    notices: broadcast::Sender<Notice>,
}

impl SyncHandle {
    /// Queue an update from the push channel or the poller
    pub fn apply(&self, update: Update) {
        self.send(Command::Apply(update));
    }

    /// Append a line to the journal
    pub fn log(&self, message: impl Into<String>, kind: LogKind) {
        self.send(Command::Log(message.into(), kind));
    }

    pub fn notify(&self, notice: Notice) {
        self.send(Command::Notice(notice));
    }

    pub fn clear_log(&self) {
        self.send(Command::ClearLog);
    }

    /// Subscribe to re-rendered rows
    pub fn on_update(&self) -> broadcast::Receiver<RowUpdate> {
        self.updates.subscribe()
    }

    /// Subscribe to transient notices
    pub fn on_notice(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Current record of every known target
    pub async fn statuses(&self) -> Result<BTreeMap<String, StatusRecord>, ConsoleError> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Statuses(tx))?;
        rx.await.map_err(|_| stopped())
    }

    /// Journal entries in display order
    pub async fn logs(&self) -> Result<Vec<LogEntry>, ConsoleError> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::Logs(tx))?;
        rx.await.map_err(|_| stopped())
    }

    fn send(&self, command: Command) {
        if self.request(command).is_err() {
            warn!("Synchronizer has stopped, dropping command");
        }
    }

    fn request(&self, command: Command) -> Result<(), ConsoleError> {
        self.tx.send(command).map_err(|_| stopped())
    }
}

fn stopped() -> ConsoleError {
    ConsoleError::ChannelError("synchronizer stopped".to_string())
}

/// Owner of the reconciled state
pub struct Synchronizer {
    board: StatusBoard,
    journal: Journal,
    renderers: Vec<Box<dyn Renderer>>,
    updates: broadcast::Sender<RowUpdate>,
    notices: broadcast::Sender<Notice>,
    rx: mpsc::UnboundedReceiver<Command>,
}

impl Synchronizer {
    pub fn new(journal: Journal, renderers: Vec<Box<dyn Renderer>>) -> (Self, SyncHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let (notices, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        let synchronizer = Self {
            board: StatusBoard::new(),
            journal,
            renderers,
            updates: updates.clone(),
            notices: notices.clone(),
            rx,
        };
        let handle = SyncHandle {
            tx,
            updates,
            notices,
        };
        (synchronizer, handle)
    }

    /// Process commands until shutdown or until every handle is dropped
    pub async fn run(mut self, mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>) {
        info!("Synchronizer starting...");

        for entry in self.journal.entries() {
            for renderer in self.renderers.iter_mut() {
                renderer.render_log(entry);
            }
        }

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => {
                    info!("Synchronizer shutting down...");
                    return;
                }
                command = self.rx.recv() => {
                    match command {
                        Some(command) => self.handle(command).await,
                        None => {
                            info!("All synchronizer handles dropped, stopping");
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Apply(update) => self.apply(update).await,
            Command::Log(message, kind) => self.append_log(message, kind).await,
            Command::Notice(notice) => {
                for renderer in self.renderers.iter_mut() {
                    renderer.render_notice(&notice);
                }
                let _ = self.notices.send(notice);
            }
            Command::ClearLog => {
                if let Err(e) = self.journal.clear().await {
                    warn!("Unable to clear persisted journal: {}", e);
                }
                for renderer in self.renderers.iter_mut() {
                    renderer.render_log_cleared();
                }
            }
            Command::Statuses(reply) => {
                let _ = reply.send(self.board.records().clone());
            }
            Command::Logs(reply) => {
                let _ = reply.send(self.journal.entries().to_vec());
            }
        }
    }

    async fn apply(&mut self, update: Update) {
        let rows = self.board.apply(&update);
        debug!("Applied update, {} row(s) changed", rows.len());

        for row in rows {
            let view = RowView::build(&row.target_id, &row.record);
            for renderer in self.renderers.iter_mut() {
                renderer.render_row(&view);
            }
            // No subscribers is fine
            let _ = self.updates.send(row);
        }

        if let Update::Push(event) = update {
            let (message, kind) = event.log_line();
            self.append_log(message, kind).await;
        }
    }

    async fn append_log(&mut self, message: String, kind: LogKind) {
        let entry = self.journal.append(message, kind).await;
        for renderer in self.renderers.iter_mut() {
            renderer.render_log(&entry);
        }
    }
}
