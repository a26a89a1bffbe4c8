//! Composite environment snapshots

use super::poller::RdsPoller;
use crate::aws::DatabaseOperations;
use crate::config::DeploymentSpec;
use crate::error::Result;
use crate::health::HealthProbe;
use crate::k8s::DeploymentOperations;
use crate::wait::Sleeper;
use envctl_common::{DatabaseInstanceState, DeploymentState, EnvironmentState};
use std::collections::BTreeMap;
use tracing::info;

/// Builds [`EnvironmentState`] snapshots from the adapters
pub struct StateCollector<'a, D, K, H, W> {
    poller: RdsPoller<'a, D, W>,
    deployments: &'a K,
    health: &'a H,
}

impl<'a, D, K, H, W> StateCollector<'a, D, K, H, W>
where
    D: DatabaseOperations,
    K: DeploymentOperations,
    H: HealthProbe,
    W: Sleeper,
{
    pub fn new(poller: RdsPoller<'a, D, W>, deployments: &'a K, health: &'a H) -> Self {
        Self {
            poller,
            deployments,
            health,
        }
    }

    /// Snapshot the database and each deployment in `specs` order.
    ///
    /// Any adapter failure aborts collection; no partial snapshot is
    /// returned. `timestamp` and `build_id` are left empty for the caller.
    pub async fn collect(
        &self,
        db_identifier: &str,
        specs: &[DeploymentSpec],
    ) -> Result<EnvironmentState> {
        let db_state = self.poller.get_status(db_identifier).await?;
        info!(identifier = %db_identifier, state = %db_state, "Collected RDS state");

        let mut deployments = BTreeMap::new();
        for spec in specs {
            let (status, health) = tokio::join!(
                self.deployments.get_status(&spec.name, &spec.namespace),
                self.health.check(&spec.health_url),
            );
            let status = status?;
            let health = health?;

            info!(
                deployment = %spec.name,
                exists = status.exists,
                replicas = ?status.replica_count,
                app_status = %health.status,
                "Collected deployment state"
            );

            deployments.insert(
                spec.name.clone(),
                DeploymentState {
                    namespace: spec.namespace.clone(),
                    exists: status.exists,
                    available: status.available,
                    available_reason: status.available_reason,
                    replica_count: status.replica_count,
                    app_status: health.status,
                    app_health_url: spec.health_url.clone(),
                },
            );
        }

        Ok(EnvironmentState {
            database_instance: DatabaseInstanceState::new(db_identifier, db_state),
            deployments,
            timestamp: String::new(),
            build_id: String::new(),
        })
    }
}
