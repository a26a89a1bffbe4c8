//! Consecutive-action guard
//!
//! Reads the latest action record and refuses to repeat an `up` or `down`
//! back to back. With no history, only `down` and `get_env_state` may run.

use crate::aws::StateStore;
use crate::error::{LifecycleError, Result};
use envctl_common::paths::ACTIONS_FILE;
use envctl_common::{ActionRecord, EnvAction};
use tracing::{info, warn};

/// Check `action` against the latest record stored under `latest_path`.
///
/// Returns the prior record when one exists.
pub async fn guard_action<S: StateStore>(
    store: &S,
    latest_path: &str,
    action: EnvAction,
) -> Result<Option<ActionRecord>> {
    let prior = match store.load(latest_path, ACTIONS_FILE).await {
        Ok(doc) => serde_json::from_value::<ActionRecord>(doc).map_err(|source| {
            LifecycleError::Json {
                op: "decode",
                what: format!("action history at '{latest_path}'"),
                source,
            }
        })?,
        Err(e) if e.is_not_found() => {
            if action == EnvAction::Up {
                return Err(LifecycleError::Validation(format!(
                    "no action history at '{latest_path}': the first action for an environment must be 'down' or 'get_env_state'"
                )));
            }
            warn!(path = %latest_path, "No action history found, treating as first run");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    info!(
        previous_action = %prior.desired_action,
        previous_build = %prior.build_id,
        previous_user = %prior.user,
        timestamp = %prior.timestamp,
        "Found previous action"
    );

    if action.is_directional() && prior.desired_action == action {
        return Err(LifecycleError::ConsecutiveAction { action });
    }

    Ok(Some(prior))
}
