//! Kubernetes deployment status and replica scaling

use crate::error::{LifecycleError, Result};
use anyhow::Context;
use k8s_openapi::api::apps::v1::Deployment;
use kube::Api;
use kube::api::{Patch, PatchParams};
use serde::Serialize;
use tracing::{debug, info};

/// Observed status of a deployment, without health information.
///
/// `available`, `available_reason` and `replica_count` are `None` when the
/// deployment does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DeploymentStatus {
    pub exists: bool,
    pub available: Option<bool>,
    pub available_reason: Option<String>,
    pub replica_count: Option<i32>,
}

impl DeploymentStatus {
    /// Status of a deployment that is not present in its namespace
    pub fn missing() -> Self {
        Self::default()
    }

    /// Derive status from a deployment object.
    ///
    /// Availability is only read from the `Available` condition when the
    /// deployment has desired replicas; a deployment scaled to zero is
    /// reported unavailable with no reason.
    pub fn from_deployment(deployment: &Deployment) -> Self {
        let replicas = deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(0);

        let mut available = false;
        let mut available_reason = None;
        if replicas > 0 {
            let condition = deployment
                .status
                .as_ref()
                .and_then(|s| s.conditions.as_ref())
                .and_then(|conds| conds.iter().find(|c| c.type_ == "Available"));
            if let Some(c) = condition {
                available = c.status == "True";
                available_reason = c.reason.clone().filter(|r| !r.is_empty());
            }
        }

        Self {
            exists: true,
            available: Some(available),
            available_reason,
            replica_count: Some(replicas),
        }
    }
}

/// Trait for deployment operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait DeploymentOperations: Send + Sync {
    /// Status of `name` in `namespace`; a missing deployment is not an error
    async fn get_status(&self, name: &str, namespace: &str) -> Result<DeploymentStatus>;

    /// Set the desired replica count; a missing deployment is `NotFound`
    async fn set_replicas(&self, name: &str, namespace: &str, replicas: i32) -> Result<()>;
}

/// Kubernetes client for the cluster's deployments
#[derive(Clone)]
pub struct K8sClient {
    client: kube::Client,
}

impl K8sClient {
    /// Connect using the local kubeconfig (or in-cluster config)
    pub async fn new() -> anyhow::Result<Self> {
        let client = kube::Client::try_default()
            .await
            .context("Failed to create Kubernetes client from kubeconfig")?;
        Ok(Self { client })
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn api_status(error: &kube::Error) -> Option<u16> {
    match error {
        kube::Error::Api(response) => Some(response.code),
        _ => None,
    }
}

fn api_failure(context: String, error: kube::Error) -> LifecycleError {
    match error {
        kube::Error::Api(response) => LifecycleError::adapter(
            context,
            format!("{} (HTTP {})", response.reason, response.code),
        ),
        other => LifecycleError::adapter(context, other),
    }
}

impl DeploymentOperations for K8sClient {
    async fn get_status(&self, name: &str, namespace: &str) -> Result<DeploymentStatus> {
        match self.deployments(namespace).get(name).await {
            Ok(deployment) => {
                let status = DeploymentStatus::from_deployment(&deployment);
                debug!(
                    deployment = %name,
                    namespace = %namespace,
                    replicas = ?status.replica_count,
                    available = ?status.available,
                    "Fetched deployment status"
                );
                Ok(status)
            }
            Err(e) if api_status(&e) == Some(404) => {
                info!(deployment = %name, namespace = %namespace, "Deployment not found");
                Ok(DeploymentStatus::missing())
            }
            Err(e) => Err(api_failure(
                format!("API error while fetching deployment '{name}'"),
                e,
            )),
        }
    }

    async fn set_replicas(&self, name: &str, namespace: &str, replicas: i32) -> Result<()> {
        let patch = serde_json::json!({ "spec": { "replicas": replicas } });

        match self
            .deployments(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => {
                info!(
                    deployment = %name,
                    namespace = %namespace,
                    replicas,
                    "Updated deployment replicas"
                );
                Ok(())
            }
            Err(e) if api_status(&e) == Some(404) => Err(LifecycleError::NotFound {
                resource: "deployment",
                id: format!("{namespace}/{name}"),
            }),
            Err(e) => Err(api_failure(
                format!("API error while updating deployment '{name}'"),
                e,
            )),
        }
    }
}
