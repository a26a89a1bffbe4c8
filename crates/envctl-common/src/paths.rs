//! History layout in the state bucket
//!
//! ```text
//! /{cluster}/{customer}/{environment}/actions.json                   latest action
//! /{cluster}/{customer}/{environment}/history/{build}/pre-state.json
//! /{cluster}/{customer}/{environment}/history/{build}/post-state.json
//! /{cluster}/{customer}/{environment}/history/{build}/actions.json
//! ```

/// Snapshot captured before an action is applied
pub const PRE_STATE_FILE: &str = "pre-state.json";

/// Snapshot captured after an action is applied
pub const POST_STATE_FILE: &str = "post-state.json";

/// Action record for the run
pub const ACTIONS_FILE: &str = "actions.json";

/// Paths for one environment's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPaths {
    root: String,
}

impl HistoryPaths {
    pub fn new(cluster: &str, customer: &str, environment: &str) -> Self {
        Self {
            root: format!("/{cluster}/{customer}/{environment}"),
        }
    }

    /// Path holding the most recent action for the environment
    pub fn latest(&self) -> &str {
        &self.root
    }

    /// Prefix under which every build's history is stored
    pub fn history(&self) -> String {
        format!("{}/history/", self.root)
    }

    /// History path for a single build
    pub fn build(&self, build_id: &str) -> String {
        format!("{}{}", self.history(), build_id)
    }
}

/// Join a logical path and file name into an object key.
///
/// Leading and trailing slashes on the path are dropped.
pub fn object_key(path: &str, file_name: &str) -> String {
    let prefix = path.trim_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{prefix}/{file_name}")
    }
}
