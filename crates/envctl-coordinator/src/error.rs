//! Error taxonomy for environment lifecycle operations
//!
//! Every adapter and every orchestration step returns [`Result`]. Failures
//! are classified once, at the adapter boundary, and then passed upward
//! unchanged.

use envctl_common::{DbLifecycleState, EnvAction};
use thiserror::Error;

/// Lifecycle operation result
pub type Result<T, E = LifecycleError> = std::result::Result<T, E>;

/// Classified failure of a lifecycle operation
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Target resource is absent (not retried)
    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    /// Resource is in a state that forbids the requested action
    #[error("cannot apply '{action}' to RDS instance '{identifier}' in state '{state}'")]
    InvalidTransition {
        identifier: String,
        state: DbLifecycleState,
        action: EnvAction,
    },

    /// Polling budget exhausted before reaching a target state
    #[error(
        "RDS instance '{identifier}' did not reach {targets} after {attempts} retries; last known state: '{last_state}'"
    )]
    Timeout {
        identifier: String,
        targets: String,
        attempts: u32,
        last_state: DbLifecycleState,
    },

    /// Underlying platform call failed for an unclassified reason
    #[error("{context}: {message}")]
    Adapter { context: String, message: String },

    /// Malformed input, unsupported action or missing history
    #[error("{0}")]
    Validation(String),

    /// Same directional action requested twice in a row
    #[error(
        "action '{action}' already performed in the previous run; repeating it consecutively is not allowed"
    )]
    ConsecutiveAction { action: EnvAction },

    /// A stored document could not be encoded or decoded
    #[error("failed to {op} {what}: {source}")]
    Json {
        op: &'static str,
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LifecycleError {
    pub fn adapter(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Adapter {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Short category name used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::Timeout { .. } => "Timeout",
            Self::Adapter { .. } => "AdapterError",
            Self::Validation(_) => "ValidationError",
            Self::ConsecutiveAction { .. } => "ConsecutiveActionError",
            Self::Json { .. } => "AdapterError",
        }
    }
}
