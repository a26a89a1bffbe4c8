//! Requested lifecycle actions and their durable history record

use serde::{Deserialize, Serialize};

/// Action requested for an environment
///
/// The string forms are stable: they are read from the CI job and written
/// into `actions.json`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnvAction {
    /// Start the database and restore deployment replicas
    Up,
    /// Scale deployments to zero and stop the database
    Down,
    /// Report the current environment without changing it
    GetEnvState,
}

impl EnvAction {
    /// Whether this action changes the environment (`up` or `down`)
    pub fn is_directional(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// One entry of the action history.
///
/// Created once per invocation and written after an `up` or `down` completes.
/// Field names on the wire match the history documents already in S3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// UTC time the invocation started (`%Y-%m-%dT%H:%M:%SZ`)
    pub timestamp: String,
    /// CI build identifier of the invocation
    #[serde(rename = "jenkins_build")]
    pub build_id: String,
    /// User who triggered the build
    #[serde(rename = "jenkins_user")]
    pub user: String,
    pub customer: String,
    pub environment: String,
    #[serde(rename = "desired_state")]
    pub desired_action: EnvAction,
}

impl ActionRecord {
    /// Build a record stamped with `at`.
    pub fn new(
        at: chrono::DateTime<chrono::Utc>,
        build_id: impl Into<String>,
        user: impl Into<String>,
        customer: impl Into<String>,
        environment: impl Into<String>,
        desired_action: EnvAction,
    ) -> Self {
        Self {
            timestamp: crate::format_timestamp(at),
            build_id: build_id.into(),
            user: user.into(),
            customer: customer.into(),
            environment: environment.into(),
            desired_action,
        }
    }
}
