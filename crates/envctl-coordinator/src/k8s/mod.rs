//! Kubernetes access for the coordinator
//!
//! - deployment: Deployment status and replica scaling
//! - kubeconfig: Refreshing the local kubeconfig for an EKS cluster

pub mod deployment;
pub mod kubeconfig;

pub use deployment::{DeploymentOperations, DeploymentStatus, K8sClient};
pub use kubeconfig::update_kubeconfig;

#[cfg(test)]
pub use deployment::MockDeploymentOperations;
