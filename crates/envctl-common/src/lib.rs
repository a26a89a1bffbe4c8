//! envctl-common - Shared types and utilities
//!
//! This crate provides the environment state model and history layout used
//! by the coordinator, without any AWS or Kubernetes SDK dependencies to keep
//! it lightweight.
//!
//! ## Modules
//!
//! - [`action`]: Requested actions and the durable action record
//! - [`defaults`]: Default wait and polling values
//! - [`paths`]: History path layout and state file names
//! - [`state`]: Database, deployment and composite environment snapshots

pub mod action;
pub mod defaults;
pub mod paths;
pub mod state;

// Re-export commonly used types
pub use action::{ActionRecord, EnvAction};
pub use paths::HistoryPaths;
pub use state::{
    AppStatus, DatabaseInstanceState, DbLifecycleState, DeploymentState, EnvironmentState,
};

/// Format a UTC instant the way history documents store it (seconds precision).
#[inline]
pub fn format_timestamp(time: chrono::DateTime<chrono::Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_has_second_precision() {
        let t = chrono::Utc
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .unwrap();
        assert_eq!(format_timestamp(t), "2024-03-09T07:05:01Z");
    }
}
