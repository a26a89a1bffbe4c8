//! Lifecycle orchestration
//!
//! A run validates the requested action against history, snapshots the
//! environment, applies the action in a fixed order with waits between
//! dependent steps, snapshots again and records both snapshots with the
//! action record. Any failure stops the run where it happened; nothing is
//! rolled back.
//!
//! ```text
//! up:   start RDS -> settle wait -> restore replicas -> warm-up wait
//! down: scale replicas to 0 -> drain wait -> stop RDS
//! ```

pub mod collector;
pub mod guard;
pub mod poller;
pub mod progress;
pub mod types;

pub use collector::StateCollector;
pub use guard::guard_action;
pub use poller::RdsPoller;
pub use progress::{LogReporter, ProgressReporter};
pub use types::{
    ApplySummary, OrchestrationReport, Phase, PhaseFailure, RdsTransition, ReplicaChange,
};

use crate::aws::{DatabaseOperations, StateStore};
use crate::config::RunConfig;
use crate::error::{LifecycleError, Result};
use crate::health::HealthProbe;
use crate::k8s::DeploymentOperations;
use crate::wait::{Sleeper, pause};
use envctl_common::paths::{ACTIONS_FILE, POST_STATE_FILE, PRE_STATE_FILE};
use envctl_common::{ActionRecord, EnvAction, EnvironmentState, HistoryPaths};
use serde::Serialize;
use tracing::{info, warn};

/// The adapters a run talks to
pub struct Adapters<D, K, H, S, W> {
    pub database: D,
    pub deployments: K,
    pub health: H,
    pub store: S,
    pub sleeper: W,
}

/// Sequences `up`, `down` and `get_env_state` for one environment
pub struct LifecycleOrchestrator<D, K, H, S, W> {
    config: RunConfig,
    paths: HistoryPaths,
    adapters: Adapters<D, K, H, S, W>,
}

fn at(phase: Phase) -> impl FnOnce(LifecycleError) -> PhaseFailure {
    move |error| PhaseFailure::new(phase, error)
}

fn to_json<T: Serialize>(value: &T, what: &str) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|source| LifecycleError::Json {
        op: "encode",
        what: what.to_string(),
        source,
    })
}

impl<D, K, H, S, W> LifecycleOrchestrator<D, K, H, S, W>
where
    D: DatabaseOperations,
    K: DeploymentOperations,
    H: HealthProbe,
    S: StateStore,
    W: Sleeper,
{
    pub fn new(config: RunConfig, adapters: Adapters<D, K, H, S, W>) -> Self {
        let paths = HistoryPaths::new(
            &config.target.cluster,
            &config.target.customer,
            &config.target.environment,
        );
        Self {
            config,
            paths,
            adapters,
        }
    }

    pub fn paths(&self) -> &HistoryPaths {
        &self.paths
    }

    pub fn adapters(&self) -> &Adapters<D, K, H, S, W> {
        &self.adapters
    }

    fn poller(&self) -> RdsPoller<'_, D, W> {
        RdsPoller::new(
            &self.adapters.database,
            &self.adapters.sleeper,
            &self.config.wait,
        )
    }

    fn collector(&self) -> StateCollector<'_, D, K, H, W> {
        StateCollector::new(
            self.poller(),
            &self.adapters.deployments,
            &self.adapters.health,
        )
    }

    /// Run the action named by `record`.
    ///
    /// On failure, reports the phase that failed together with the unchanged
    /// cause.
    pub async fn run(
        &self,
        record: ActionRecord,
        reporter: &dyn ProgressReporter,
    ) -> std::result::Result<OrchestrationReport, PhaseFailure> {
        let action = record.desired_action;
        info!(
            action = %action,
            build = %record.build_id,
            user = %record.user,
            customer = %self.config.target.customer,
            environment = %self.config.target.environment,
            "Starting lifecycle run"
        );
        reporter.phase(Phase::Starting);

        reporter.phase(Phase::CheckingGuard);
        let previous = guard_action(&self.adapters.store, self.paths.latest(), action)
            .await
            .map_err(at(Phase::CheckingGuard))?;
        match &previous {
            Some(prior) => {
                let data = to_json(prior, "previous action").map_err(at(Phase::CheckingGuard))?;
                reporter.step(
                    "PREVIOUS ACTION",
                    &format!(
                        "Last action was '{}' by build {}",
                        prior.desired_action, prior.build_id
                    ),
                    Some(&data),
                );
            }
            None => reporter.step("PREVIOUS ACTION", "No previous action recorded", None),
        }

        reporter.phase(Phase::CapturingPreState);
        let pre_state = self
            .snapshot(&record)
            .await
            .map_err(at(Phase::CapturingPreState))?;
        let label = if action == EnvAction::GetEnvState {
            "CURRENT STATE"
        } else {
            "PRE-ACTION STATE"
        };
        self.report_state(reporter, label, &pre_state)
            .map_err(at(Phase::CapturingPreState))?;

        let (restore_target, apply) = match action {
            EnvAction::GetEnvState => {
                reporter.phase(Phase::Done);
                return Ok(OrchestrationReport {
                    action,
                    previous,
                    pre_state,
                    restore_target: None,
                    apply: None,
                    post_state: None,
                    recorded: None,
                });
            }
            EnvAction::Up => {
                reporter.phase(Phase::LoadingRestoreTarget);
                let target = self
                    .load_restore_target(previous.as_ref())
                    .await
                    .map_err(at(Phase::LoadingRestoreTarget))?;
                self.report_state(reporter, "RESTORE TARGET", &target)
                    .map_err(at(Phase::LoadingRestoreTarget))?;

                reporter.phase(Phase::Applying);
                let apply = self.bring_up(&target).await.map_err(at(Phase::Applying))?;
                (Some(target), apply)
            }
            EnvAction::Down => {
                reporter.phase(Phase::Applying);
                let apply = self
                    .bring_down(&pre_state)
                    .await
                    .map_err(at(Phase::Applying))?;
                (None, apply)
            }
        };
        let data = to_json(&apply, "apply summary").map_err(at(Phase::Applying))?;
        reporter.step(
            "APPLY ACTION",
            &format!("Action '{action}' applied"),
            Some(&data),
        );

        reporter.phase(Phase::CapturingPostState);
        let post_state = self
            .snapshot(&record)
            .await
            .map_err(at(Phase::CapturingPostState))?;
        self.report_state(reporter, "POST-ACTION STATE", &post_state)
            .map_err(at(Phase::CapturingPostState))?;

        reporter.phase(Phase::Recording);
        self.record(&record, &pre_state, &post_state)
            .await
            .map_err(at(Phase::Recording))?;
        reporter.step(
            "RECORD HISTORY",
            &format!(
                "Recorded build {} under '{}'",
                record.build_id,
                self.paths.build(&record.build_id)
            ),
            None,
        );

        reporter.phase(Phase::Done);
        info!(action = %action, build = %record.build_id, "Lifecycle run complete");

        Ok(OrchestrationReport {
            action,
            previous,
            pre_state,
            restore_target,
            apply: Some(apply),
            post_state: Some(post_state),
            recorded: Some(record),
        })
    }

    /// Collect a snapshot stamped with the run's timestamp and build
    async fn snapshot(&self, record: &ActionRecord) -> Result<EnvironmentState> {
        let mut state = self
            .collector()
            .collect(
                &self.config.target.rds_identifier,
                &self.config.target.deployments,
            )
            .await?;
        state.timestamp = record.timestamp.clone();
        state.build_id = record.build_id.clone();
        Ok(state)
    }

    fn report_state(
        &self,
        reporter: &dyn ProgressReporter,
        label: &str,
        state: &EnvironmentState,
    ) -> Result<()> {
        let data = to_json(state, "environment state")?;
        reporter.step(
            label,
            &format!(
                "RDS '{}' is '{}', {} deployment(s) tracked",
                state.database_instance.identifier,
                state.database_instance.lifecycle_state,
                state.deployments.len()
            ),
            Some(&data),
        );
        Ok(())
    }

    /// Load the pre-action snapshot of the previous run.
    ///
    /// The previous run was a `down`, so its pre-state holds the replica
    /// counts the environment had while it was up.
    async fn load_restore_target(&self, previous: Option<&ActionRecord>) -> Result<EnvironmentState> {
        let prior = previous.ok_or_else(|| {
            LifecycleError::Validation(
                "no previous action recorded; nothing to restore replicas from".to_string(),
            )
        })?;

        let path = self.paths.build(&prior.build_id);
        let doc = self.adapters.store.load(&path, PRE_STATE_FILE).await?;
        let target: EnvironmentState =
            serde_json::from_value(doc).map_err(|source| LifecycleError::Json {
                op: "decode",
                what: format!("restore target '{path}/{PRE_STATE_FILE}'"),
                source,
            })?;

        info!(
            build = %prior.build_id,
            deployments = target.deployments.len(),
            "Loaded restore target"
        );
        Ok(target)
    }

    /// Names in `snapshot`, configured deployments first in configured order
    fn scale_order<'s>(&self, snapshot: &'s EnvironmentState) -> Vec<&'s str> {
        let mut names: Vec<&str> = self
            .config
            .target
            .deployments
            .iter()
            .filter_map(|spec| snapshot.deployments.get_key_value(&spec.name))
            .map(|(name, _)| name.as_str())
            .collect();
        for name in snapshot.deployments.keys() {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    /// Set every existing deployment in `snapshot` to `replicas_for(name)`
    async fn scale_deployments(
        &self,
        snapshot: &EnvironmentState,
        replicas_for: impl Fn(&str) -> Option<i32>,
    ) -> Result<(Vec<ReplicaChange>, Vec<String>)> {
        let mut scaled = Vec::new();
        let mut skipped = Vec::new();

        for name in self.scale_order(snapshot) {
            let Some(deployment) = snapshot.deployments.get(name) else {
                continue;
            };
            let Some(replicas) = replicas_for(name) else {
                warn!(deployment = %name, "Deployment does not exist, skipping");
                skipped.push(name.to_string());
                continue;
            };

            self.adapters
                .deployments
                .set_replicas(name, &deployment.namespace, replicas)
                .await?;
            scaled.push(ReplicaChange {
                name: name.to_string(),
                namespace: deployment.namespace.clone(),
                replicas,
            });
        }

        Ok((scaled, skipped))
    }

    async fn bring_up(&self, target: &EnvironmentState) -> Result<ApplySummary> {
        let wait = &self.config.wait;

        info!("Starting RDS instance");
        let database = self
            .poller()
            .apply_action(&self.config.target.rds_identifier, EnvAction::Up)
            .await?;
        pause(&self.adapters.sleeper, wait.db_settle, "RDS to be accessible").await;

        info!("Restoring deployment replicas to previous state");
        let (scaled, skipped) = self
            .scale_deployments(target, |name| target.restorable_replicas(name))
            .await?;
        pause(
            &self.adapters.sleeper,
            wait.app_warmup,
            "application endpoints to be accessible",
        )
        .await;

        Ok(ApplySummary {
            action: EnvAction::Up,
            database,
            scaled,
            skipped,
        })
    }

    async fn bring_down(&self, current: &EnvironmentState) -> Result<ApplySummary> {
        let wait = &self.config.wait;

        info!("Scaling deployments to 0");
        let (scaled, skipped) = self
            .scale_deployments(current, |name| {
                current
                    .deployments
                    .get(name)
                    .filter(|d| d.exists)
                    .map(|_| 0)
            })
            .await?;
        pause(&self.adapters.sleeper, wait.pod_drain, "pods to be terminated").await;

        info!("Stopping RDS instance");
        let database = self
            .poller()
            .apply_action(&self.config.target.rds_identifier, EnvAction::Down)
            .await?;

        Ok(ApplySummary {
            action: EnvAction::Down,
            database,
            scaled,
            skipped,
        })
    }

    /// Persist both snapshots and the action record
    async fn record(
        &self,
        record: &ActionRecord,
        pre_state: &EnvironmentState,
        post_state: &EnvironmentState,
    ) -> Result<()> {
        let build_path = self.paths.build(&record.build_id);
        let store = &self.adapters.store;

        store
            .save(&build_path, PRE_STATE_FILE, &to_json(pre_state, PRE_STATE_FILE)?)
            .await?;
        store
            .save(&build_path, POST_STATE_FILE, &to_json(post_state, POST_STATE_FILE)?)
            .await?;

        let actions = to_json(record, ACTIONS_FILE)?;
        store.save(&build_path, ACTIONS_FILE, &actions).await?;
        store
            .save(self.paths.latest(), ACTIONS_FILE, &actions)
            .await?;
        Ok(())
    }
}
