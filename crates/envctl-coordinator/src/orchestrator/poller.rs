//! RDS status polling and start/stop transitions
//!
//! The poller is the only component that retries. It re-reads the instance
//! state at a fixed interval until the state is one of the targets or the
//! attempt budget runs out.

use super::types::RdsTransition;
use crate::aws::DatabaseOperations;
use crate::config::WaitPolicy;
use crate::error::{LifecycleError, Result};
use crate::wait::Sleeper;
use envctl_common::{DbLifecycleState, EnvAction};
use std::time::Duration;
use tracing::{debug, info};

const STABLE_STATES: &[DbLifecycleState] = &[DbLifecycleState::Available, DbLifecycleState::Stopped];

/// Polls one database adapter using one sleeper
pub struct RdsPoller<'a, D, W> {
    db: &'a D,
    sleeper: &'a W,
    interval: Duration,
    max_attempts: u32,
}

impl<'a, D: DatabaseOperations, W: Sleeper> RdsPoller<'a, D, W> {
    pub fn new(db: &'a D, sleeper: &'a W, wait: &WaitPolicy) -> Self {
        Self {
            db,
            sleeper,
            interval: wait.poll_interval,
            max_attempts: wait.max_poll_attempts,
        }
    }

    /// Wait until the instance reaches one of `targets`.
    ///
    /// Sleeps at most `max_attempts` times. Adapter failures (including
    /// `NotFound`) end polling immediately.
    pub async fn poll_until(
        &self,
        identifier: &str,
        targets: &[DbLifecycleState],
    ) -> Result<DbLifecycleState> {
        let mut state = self.db.describe(identifier).await?;
        let mut attempts = 0;

        loop {
            if targets.contains(&state) {
                info!(identifier = %identifier, state = %state, "RDS instance reached target state");
                return Ok(state);
            }
            if attempts >= self.max_attempts {
                return Err(LifecycleError::Timeout {
                    identifier: identifier.to_string(),
                    targets: format_targets(targets),
                    attempts,
                    last_state: state,
                });
            }

            attempts += 1;
            info!(
                identifier = %identifier,
                state = %state,
                attempt = attempts,
                max_attempts = self.max_attempts,
                "RDS instance is in state '{}'. Waiting {} seconds before checking again",
                state,
                self.interval.as_secs()
            );
            self.sleeper.sleep(self.interval).await;
            state = self.db.describe(identifier).await?;
        }
    }

    /// Current state, waiting out any transition first
    pub async fn get_status(&self, identifier: &str) -> Result<DbLifecycleState> {
        let state = self.db.describe(identifier).await?;
        if state.is_stable() {
            return Ok(state);
        }
        debug!(identifier = %identifier, state = %state, "RDS instance is transitioning");
        self.poll_until(identifier, STABLE_STATES).await
    }

    /// Drive the instance to the state `action` requires
    pub async fn apply_action(&self, identifier: &str, action: EnvAction) -> Result<RdsTransition> {
        let (target, already) = match action {
            EnvAction::Up => (DbLifecycleState::Available, "running"),
            EnvAction::Down => (DbLifecycleState::Stopped, "stopped"),
            EnvAction::GetEnvState => {
                return Err(LifecycleError::Validation(format!(
                    "'{action}' is not a database action"
                )));
            }
        };

        let from = self.get_status(identifier).await?;
        if from == target {
            info!(identifier = %identifier, "RDS instance is already {}", already);
            return Ok(RdsTransition {
                identifier: identifier.to_string(),
                from: from.clone(),
                to: from,
                changed: false,
            });
        }

        match (action, &from) {
            (EnvAction::Up, DbLifecycleState::Stopped) => self.db.start(identifier).await?,
            (EnvAction::Down, DbLifecycleState::Available) => self.db.stop(identifier).await?,
            _ => {
                return Err(LifecycleError::InvalidTransition {
                    identifier: identifier.to_string(),
                    state: from,
                    action,
                });
            }
        }

        let to = self.poll_until(identifier, std::slice::from_ref(&target)).await?;
        Ok(RdsTransition {
            identifier: identifier.to_string(),
            from,
            to,
            changed: true,
        })
    }
}

fn format_targets(targets: &[DbLifecycleState]) -> String {
    targets
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(" or ")
}
