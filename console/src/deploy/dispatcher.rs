//! Deploy control dispatch
//!
//! Sends operator actions to the backend. Failures are surfaced right away
//! as alerts naming the action and are never retried automatically.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::deploy::action::{DeployAction, ServeCommand};
use crate::deploy::gate::{BuildGate, BuildState};
use crate::errors::ConsoleError;
use crate::http::actions::{BuildReport, DeployBackend, ServeReport};
use crate::models::log_entry::LogKind;
use crate::models::notice::Notice;
use crate::models::serve::ServeStatus;
use crate::sync::synchronizer::SyncHandle;

/// Outcome of a batch deploy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub accepted: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub target_id: String,
    pub error: String,
}

pub struct Dispatcher<B: DeployBackend + ?Sized> {
    backend: Arc<B>,
    sync: SyncHandle,
    gate: Mutex<BuildGate>,
}

impl<B: DeployBackend + ?Sized> Dispatcher<B> {
    pub fn new(backend: Arc<B>, sync: SyncHandle) -> Self {
        Self {
            backend,
            sync,
            gate: Mutex::new(BuildGate::new()),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn build_state(&self) -> BuildState {
        self.gate().state()
    }

    pub fn deploy_enabled(&self) -> bool {
        self.gate().deploy_enabled()
    }

    fn gate(&self) -> MutexGuard<'_, BuildGate> {
        lock_gate(&self.gate)
    }

    /// Trigger one action on one target
    pub async fn trigger(
        &self,
        action: DeployAction,
        target_id: &str,
    ) -> Result<String, ConsoleError> {
        if action.requires_build() && !self.deploy_enabled() {
            self.sync.notify(Notice::warning("Build the site before deploying"));
            return Err(ConsoleError::DeployBlocked(
                "no successful build in this session".to_string(),
            ));
        }

        info!("{} target {}", action.pending_message(), target_id);
        match self.backend.trigger_action(action, target_id).await {
            Ok(message) => {
                self.sync.notify(Notice::info(message.clone()));
                Ok(message)
            }
            Err(e) => {
                warn!("Action {} on {} failed: {}", action, target_id, e);
                self.sync.notify(Notice::alert(alert_text(action, &e)));
                Err(e)
            }
        }
    }

    /// Build the site and open or close the gate accordingly.
    ///
    /// If the returned future is dropped before the backend answers, the
    /// gate is closed as a failed build so a later build can run.
    pub async fn build(&self) -> Result<BuildReport, ConsoleError> {
        let in_flight = {
            let mut gate = self.gate();
            if gate.state() == BuildState::Building {
                return Err(ConsoleError::Busy("a build is already running".to_string()));
            }
            gate.begin_build();
            BuildInFlight {
                gate: &self.gate,
                finished: false,
            }
        };
        self.sync.log("INFO: Starting Hugo build...", LogKind::Info);

        match self.backend.build_site().await {
            Ok(report) => {
                in_flight.finish(true);
                self.sync.log("SUCCESS: Hugo build succeeded", LogKind::Success);
                if !report.output.trim().is_empty() {
                    self.sync
                        .log(format!("Build output:\n{}", report.output), LogKind::Info);
                }
                self.sync
                    .notify(Notice::success(format!("Build succeeded: {}", report.message)));
                Ok(report)
            }
            Err(failure) => {
                in_flight.finish(false);
                self.sync.log(
                    format!("ERROR: Hugo build failed - {}", failure.error),
                    LogKind::Error,
                );
                if !failure.output.trim().is_empty() {
                    self.sync
                        .log(format!("Build output:\n{}", failure.output), LogKind::Warning);
                }
                self.sync
                    .notify(Notice::error(format!("Build failed: {}", failure.error)));
                Err(ConsoleError::BuildFailed(failure.error))
            }
        }
    }

    /// Start, stop or restart the backend's preview server
    pub async fn serve(
        &self,
        command: ServeCommand,
        port: u16,
    ) -> Result<ServeReport, ConsoleError> {
        info!("Hugo serve {} requested", command);
        let outcome = match command {
            ServeCommand::Start => self.backend.start_serve(port).await,
            ServeCommand::Stop => self.backend.stop_serve().await,
            ServeCommand::Restart => self.backend.restart_serve().await,
        };

        match outcome {
            Ok(report) => {
                self.sync
                    .log(format!("SUCCESS: {}", command.done_message()), LogKind::Success);
                self.sync.notify(Notice::success(report.message.clone()));
                Ok(report)
            }
            Err(failure) => {
                warn!("Hugo serve {} failed: {}", command, failure.error);
                let text = format!("Hugo serve {} failed: {}", command, failure.error);
                self.sync.log(format!("ERROR: {}", text), LogKind::Error);
                if !failure.stderr.trim().is_empty() {
                    self.sync.log(
                        format!("Hugo serve error output:\n{}", failure.stderr),
                        LogKind::Error,
                    );
                }
                if !failure.output.trim().is_empty() {
                    self.sync
                        .log(format!("Hugo serve output:\n{}", failure.output), LogKind::Warning);
                }
                self.sync.notify(Notice::error(text));
                Err(ConsoleError::ServeFailed(failure.error))
            }
        }
    }

    pub async fn serve_status(&self) -> Result<ServeStatus, ConsoleError> {
        self.backend.serve_status().await
    }

    /// Deploy to every enabled target at once
    pub async fn deploy_all(&self, incremental: bool) -> Result<BatchReport, ConsoleError> {
        if !self.deploy_enabled() {
            self.sync.notify(Notice::warning("Build the site before deploying"));
            return Err(ConsoleError::DeployBlocked(
                "no successful build in this session".to_string(),
            ));
        }

        let targets: Vec<String> = self
            .backend
            .list_targets()
            .await?
            .into_iter()
            .filter(|target| target.enabled)
            .map(|target| target.id)
            .collect();
        if targets.is_empty() {
            self.sync.notify(Notice::warning("No enabled targets"));
            return Err(ConsoleError::DeployBlocked("no enabled targets".to_string()));
        }

        let (action, label) = if incremental {
            (DeployAction::IncrementalDeploy, "incremental deploy")
        } else {
            (DeployAction::Deploy, "full deploy")
        };
        self.sync.log(
            format!("INFO: Starting batch {} to {} target(s)", label, targets.len()),
            LogKind::Info,
        );
        self.sync.notify(Notice::info(format!("Starting batch {}", label)));

        let results = join_all(targets.iter().map(|id| self.trigger(action, id))).await;

        let mut report = BatchReport::default();
        for (target_id, result) in targets.into_iter().zip(results) {
            match result {
                Ok(_) => report.accepted.push(target_id),
                Err(e) => report.failed.push(BatchFailure {
                    target_id,
                    error: e.to_string(),
                }),
            }
        }
        Ok(report)
    }
}

fn lock_gate(gate: &Mutex<BuildGate>) -> MutexGuard<'_, BuildGate> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Closes the gate as failed when dropped before `finish`
struct BuildInFlight<'a> {
    gate: &'a Mutex<BuildGate>,
    finished: bool,
}

impl BuildInFlight<'_> {
    fn finish(mut self, succeeded: bool) {
        let mut gate = lock_gate(self.gate);
        if succeeded {
            gate.build_succeeded();
        } else {
            gate.build_failed();
        }
        self.finished = true;
    }
}

impl Drop for BuildInFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Build abandoned before the backend answered");
            lock_gate(self.gate).build_failed();
        }
    }
}

fn alert_text(action: DeployAction, error: &ConsoleError) -> String {
    match error {
        ConsoleError::ActionFailed { reason, .. } => format!("{} failed: {}", action, reason),
        other => format!("{} failed: {}", action, other),
    }
}
