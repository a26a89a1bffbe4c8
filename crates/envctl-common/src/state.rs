//! Environment snapshot types
//!
//! An [`EnvironmentState`] captures the database instance and every managed
//! deployment at one instant. Snapshots are persisted as `pre-state.json` and
//! `post-state.json`; the JSON keys match the history documents written by
//! earlier versions of the tooling so old snapshots remain restorable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state reported by RDS for a database instance.
///
/// Only `available` and `stopped` are stable. Every other value is a transient
/// phase managed by AWS; unknown strings are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DbLifecycleState {
    #[default]
    Unknown,
    Available,
    Stopped,
    Starting,
    Stopping,
    Creating,
    Modifying,
    Rebooting,
    BackingUp,
    /// Any other transient state (e.g. `upgrading`, `maintenance`)
    Other(String),
}

impl DbLifecycleState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "unknown",
            Self::Available => "available",
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Stopping => "stopping",
            Self::Creating => "creating",
            Self::Modifying => "modifying",
            Self::Rebooting => "rebooting",
            Self::BackingUp => "backing-up",
            Self::Other(s) => s,
        }
    }

    /// `available` or `stopped`: the instance is not mid-transition.
    pub fn is_stable(&self) -> bool {
        matches!(self, Self::Available | Self::Stopped)
    }
}

impl From<&str> for DbLifecycleState {
    fn from(s: &str) -> Self {
        match s {
            "unknown" | "" => Self::Unknown,
            "available" => Self::Available,
            "stopped" => Self::Stopped,
            "starting" => Self::Starting,
            "stopping" => Self::Stopping,
            "creating" => Self::Creating,
            "modifying" => Self::Modifying,
            "rebooting" => Self::Rebooting,
            "backing-up" => Self::BackingUp,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for DbLifecycleState {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<DbLifecycleState> for String {
    fn from(state: DbLifecycleState) -> Self {
        match state {
            DbLifecycleState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DbLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application health as seen by the HTTP probe
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppStatus {
    Up,
    #[default]
    Down,
}

fn default_exists() -> bool {
    true
}

/// Observed state of the database instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInstanceState {
    // Snapshots taken right after a settle poll were written without the
    // identifier and existence flag.
    #[serde(rename = "rds_identifier", default)]
    pub identifier: String,
    #[serde(rename = "rds_exists", default = "default_exists")]
    pub exists: bool,
    #[serde(rename = "rds_state")]
    pub lifecycle_state: DbLifecycleState,
}

impl DatabaseInstanceState {
    pub fn new(identifier: impl Into<String>, lifecycle_state: DbLifecycleState) -> Self {
        Self {
            identifier: identifier.into(),
            exists: true,
            lifecycle_state,
        }
    }
}

/// Observed state of one Kubernetes deployment.
///
/// `available` and `replica_count` are only meaningful when `exists` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentState {
    #[serde(rename = "deployment_namespace")]
    pub namespace: String,
    #[serde(rename = "deployment_exists")]
    pub exists: bool,
    #[serde(rename = "deployment_available")]
    pub available: Option<bool>,
    #[serde(rename = "deployment_available_reason")]
    pub available_reason: Option<String>,
    #[serde(rename = "deployment_replicas")]
    pub replica_count: Option<i32>,
    #[serde(default)]
    pub app_status: AppStatus,
    #[serde(rename = "app_url", default)]
    pub app_health_url: String,
}

/// Composite snapshot of the environment at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentState {
    #[serde(rename = "aws_rds")]
    pub database_instance: DatabaseInstanceState,
    #[serde(rename = "k8s_deployments")]
    pub deployments: BTreeMap<String, DeploymentState>,
    /// Invocation timestamp of the run that captured this snapshot
    #[serde(default)]
    pub timestamp: String,
    /// Build identifier of the run that captured this snapshot
    #[serde(rename = "jenkins_build", default)]
    pub build_id: String,
}

impl EnvironmentState {
    /// Replica count to restore for `name`, if the deployment existed when
    /// the snapshot was taken.
    pub fn restorable_replicas(&self, name: &str) -> Option<i32> {
        self.deployments
            .get(name)
            .filter(|d| d.exists)
            .map(|d| d.replica_count.unwrap_or(0))
    }
}
