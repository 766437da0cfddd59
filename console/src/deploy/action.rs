//! Per-target deploy actions

use std::str::FromStr;

use crate::errors::ConsoleError;

/// Fire-and-forget actions addressed as `{action}/{target_id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployAction {
    Deploy,
    IncrementalDeploy,
    BuildDeploy,
    IncrementalBuildDeploy,
    Pause,
    Resume,
    Stop,
}

impl DeployAction {
    pub const ALL: [DeployAction; 7] = [
        DeployAction::Deploy,
        DeployAction::IncrementalDeploy,
        DeployAction::BuildDeploy,
        DeployAction::IncrementalBuildDeploy,
        DeployAction::Pause,
        DeployAction::Resume,
        DeployAction::Stop,
    ];

    pub fn as_path(&self) -> &'static str {
        match self {
            DeployAction::Deploy => "deploy",
            DeployAction::IncrementalDeploy => "incremental-deploy",
            DeployAction::BuildDeploy => "build-deploy",
            DeployAction::IncrementalBuildDeploy => "incremental-build-deploy",
            DeployAction::Pause => "pause",
            DeployAction::Resume => "resume",
            DeployAction::Stop => "stop",
        }
    }

    /// Actions that ship the output of the last local build. The
    /// build-and-deploy variants build on the backend themselves.
    pub fn requires_build(&self) -> bool {
        matches!(self, DeployAction::Deploy | DeployAction::IncrementalDeploy)
    }

    /// Shown while the backend has not answered yet
    pub fn pending_message(&self) -> &'static str {
        match self {
            DeployAction::Deploy => "Running full deploy...",
            DeployAction::IncrementalDeploy => "Running incremental deploy...",
            DeployAction::BuildDeploy => "Building and running full deploy...",
            DeployAction::IncrementalBuildDeploy => "Building and running incremental deploy...",
            DeployAction::Pause => "Pausing...",
            DeployAction::Resume => "Resuming...",
            DeployAction::Stop => "Stopping...",
        }
    }
}

impl std::fmt::Display for DeployAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for DeployAction {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeployAction::ALL
            .into_iter()
            .find(|action| action.as_path() == s)
            .ok_or_else(|| ConsoleError::NotFound(format!("Unknown action: {}", s)))
    }
}

/// Controls for the backend's `hugo serve` preview process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServeCommand {
    Start,
    Stop,
    Restart,
}

impl ServeCommand {
    pub const ALL: [ServeCommand; 3] = [ServeCommand::Start, ServeCommand::Stop, ServeCommand::Restart];

    pub fn as_path(&self) -> &'static str {
        match self {
            ServeCommand::Start => "start",
            ServeCommand::Stop => "stop",
            ServeCommand::Restart => "restart",
        }
    }

    /// Journal line written when the backend accepts the command
    pub fn done_message(&self) -> &'static str {
        match self {
            ServeCommand::Start => "Hugo serve started",
            ServeCommand::Stop => "Hugo serve stopped",
            ServeCommand::Restart => "Hugo serve restarted",
        }
    }
}

impl std::fmt::Display for ServeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for ServeCommand {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServeCommand::ALL
            .into_iter()
            .find(|command| command.as_path() == s)
            .ok_or_else(|| ConsoleError::NotFound(format!("Unknown serve command: {}", s)))
    }
}
