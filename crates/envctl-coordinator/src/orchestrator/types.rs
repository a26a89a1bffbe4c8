//! Types shared across the orchestrator

use crate::error::LifecycleError;
use envctl_common::{ActionRecord, DbLifecycleState, EnvAction, EnvironmentState};
use serde::Serialize;
use thiserror::Error;

/// Phase of a lifecycle run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum Phase {
    #[strum(serialize = "Starting")]
    Starting,
    #[strum(serialize = "Checking action history")]
    CheckingGuard,
    #[strum(serialize = "Capturing pre-action state")]
    CapturingPreState,
    #[strum(serialize = "Loading restore target")]
    LoadingRestoreTarget,
    #[strum(serialize = "Applying action")]
    Applying,
    #[strum(serialize = "Capturing post-action state")]
    CapturingPostState,
    #[strum(serialize = "Recording history")]
    Recording,
    #[strum(serialize = "Done")]
    Done,
}

/// Result of driving the database toward an action's target state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RdsTransition {
    pub identifier: String,
    /// Settled state before the action
    pub from: DbLifecycleState,
    /// State after the action
    pub to: DbLifecycleState,
    /// False when the instance was already in the target state
    pub changed: bool,
}

/// A replica count written to one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicaChange {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
}

/// What an `up` or `down` changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub action: EnvAction,
    pub database: RdsTransition,
    /// Deployments whose replica count was set, in the order they were set
    pub scaled: Vec<ReplicaChange>,
    /// Deployments left alone because they did not exist
    pub skipped: Vec<String>,
}

/// Final report of a lifecycle run
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationReport {
    pub action: EnvAction,
    /// Most recent recorded action before this run
    pub previous: Option<ActionRecord>,
    /// Snapshot before the action (the only snapshot for `get_env_state`)
    pub pre_state: EnvironmentState,
    /// Snapshot whose replica counts `up` restored
    pub restore_target: Option<EnvironmentState>,
    pub apply: Option<ApplySummary>,
    pub post_state: Option<EnvironmentState>,
    /// Action record persisted by this run
    pub recorded: Option<ActionRecord>,
}

/// A failed run: the phase it stopped in and the unchanged cause
#[derive(Debug, Error)]
#[error("{phase} failed: {error}")]
pub struct PhaseFailure {
    pub phase: Phase,
    #[source]
    pub error: LifecycleError,
}

impl PhaseFailure {
    pub fn new(phase: Phase, error: LifecycleError) -> Self {
        Self { phase, error }
    }
}
