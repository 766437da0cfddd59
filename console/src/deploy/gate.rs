//! Build gate for deploy controls

use serde::Serialize;

/// Outcome of the latest build in this session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    #[default]
    NotBuilt,
    Building,
    Built,
    Failed,
}

/// Deploy controls are enabled only after a successful build in the current
/// session. Nothing here is derived from the backend: every process starts
/// with the gate closed.
#[derive(Debug, Clone, Default)]
pub struct BuildGate {
    state: BuildState,
}

impl BuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn deploy_enabled(&self) -> bool {
        self.state == BuildState::Built
    }

    /// Close the gate while a build runs
    pub fn begin_build(&mut self) {
        self.state = BuildState::Building;
    }

    pub fn build_succeeded(&mut self) {
        self.state = BuildState::Built;
    }

    pub fn build_failed(&mut self) {
        self.state = BuildState::Failed;
    }
}
