//! Local kubeconfig refresh for an EKS cluster

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::info;

/// Arguments passed to the AWS CLI to refresh the kubeconfig entry
fn update_kubeconfig_args(cluster: &str, region: &str) -> Vec<String> {
    ["eks", "update-kubeconfig", "--region", region, "--name", cluster]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Refresh the local kubeconfig for `cluster` via `aws eks update-kubeconfig`.
pub async fn update_kubeconfig(cluster: &str, region: &str) -> Result<()> {
    info!(cluster = %cluster, region = %region, "Updating kubeconfig");

    let status = Command::new("aws")
        .args(update_kubeconfig_args(cluster, region))
        .status()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("AWS CLI not found. Make sure it is installed and in PATH")
            } else {
                anyhow::Error::new(e)
            }
        })
        .context("Failed to run 'aws eks update-kubeconfig'")?;

    if !status.success() {
        bail!(
            "'aws eks update-kubeconfig' failed with exit code {}",
            status
                .code()
                .map_or_else(|| "unknown".to_string(), |c| c.to_string())
        );
    }

    info!(cluster = %cluster, "Kubeconfig updated");
    Ok(())
}
