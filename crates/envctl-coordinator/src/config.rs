//! Configuration types for the coordinator
//!
//! A [`RunConfig`] is built once by the driver and handed to the orchestrator
//! by value; nothing reads process environment after that point.

use envctl_common::defaults::{
    DEFAULT_APP_WARMUP_SECS, DEFAULT_DB_SETTLE_SECS, DEFAULT_POD_DRAIN_SECS,
    DEFAULT_RDS_MAX_POLL_ATTEMPTS, DEFAULT_RDS_POLL_INTERVAL_SECS,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required identifier is empty
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// The manifest lists no deployments
    #[error("manifest must list at least one deployment")]
    NoDeployments,

    /// A deployment entry has no name
    #[error("deployment entry {0} has an empty name")]
    EmptyDeploymentName(usize),

    /// The same deployment is listed twice
    #[error("deployment '{0}' is listed more than once")]
    DuplicateDeployment(String),

    /// RDS polling would never check the instance
    #[error("rds_max_poll_attempts must be at least 1")]
    InvalidPollAttempts,

    /// Manifest could not be read
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid JSON
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One managed deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSpec {
    pub name: String,
    pub namespace: String,
    pub health_url: String,
}

impl DeploymentSpec {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        health_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            health_url: health_url.into(),
        }
    }
}

/// Identity of the environment being operated on
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// EKS cluster name
    pub cluster: String,
    /// Customer name
    pub customer: String,
    /// Customer environment (e.g. "staging", "qa")
    pub environment: String,
    /// RDS instance identifier
    pub rds_identifier: String,
    /// Deployments in the order they are scaled
    pub deployments: Vec<DeploymentSpec>,
}

/// AWS configuration
#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// Region of the EKS cluster and RDS instance
    pub region: String,
    /// Bucket holding environment history
    pub state_bucket: String,
    /// Region of the history bucket
    pub state_region: String,
}

/// Fixed waits and the RDS polling budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Interval between RDS status checks
    pub poll_interval: Duration,
    /// Number of status re-checks before polling times out
    pub max_poll_attempts: u32,
    /// Wait after the database is up, before deployments are restored
    pub db_settle: Duration,
    /// Wait after deployments are scaled down, before the database is stopped
    pub pod_drain: Duration,
    /// Wait after deployments are restored, before the run completes
    pub app_warmup: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_RDS_POLL_INTERVAL_SECS),
            max_poll_attempts: DEFAULT_RDS_MAX_POLL_ATTEMPTS,
            db_settle: Duration::from_secs(DEFAULT_DB_SETTLE_SECS),
            pod_drain: Duration::from_secs(DEFAULT_POD_DRAIN_SECS),
            app_warmup: Duration::from_secs(DEFAULT_APP_WARMUP_SECS),
        }
    }
}

/// Runtime behavior flags
#[derive(Debug, Clone, Default)]
pub struct RuntimeFlags {
    /// Do not refresh the local kubeconfig before connecting
    pub skip_kubeconfig: bool,
}

/// Configuration for one lifecycle run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: TargetConfig,
    pub aws: AwsConfig,
    pub wait: WaitPolicy,
    pub flags: RuntimeFlags,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("cluster", &self.target.cluster),
            ("customer", &self.target.customer),
            ("environment", &self.target.environment),
            ("rds_identifier", &self.target.rds_identifier),
            ("region", &self.aws.region),
            ("state_bucket", &self.aws.state_bucket),
            ("state_region", &self.aws.state_region),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(name));
            }
        }

        if self.target.deployments.is_empty() {
            return Err(ConfigError::NoDeployments);
        }
        let mut seen = HashSet::new();
        for (i, d) in self.target.deployments.iter().enumerate() {
            if d.name.trim().is_empty() {
                return Err(ConfigError::EmptyDeploymentName(i));
            }
            if !seen.insert(d.name.as_str()) {
                return Err(ConfigError::DuplicateDeployment(d.name.clone()));
            }
        }

        if self.wait.max_poll_attempts == 0 {
            return Err(ConfigError::InvalidPollAttempts);
        }
        Ok(())
    }
}

/// One deployment entry in a manifest, before placeholder expansion
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDeployment {
    pub name: String,
    /// Defaults to the manifest's namespace
    #[serde(default)]
    pub namespace: Option<String>,
    pub health_url: String,
}

/// Describes which resources make up an environment.
///
/// String values may contain `{customer}` and `{env}` placeholders.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentManifest {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_rds_identifier")]
    pub rds_identifier: String,
    pub deployments: Vec<ManifestDeployment>,
}

fn default_namespace() -> String {
    "{customer}-{env}".to_string()
}

fn default_rds_identifier() -> String {
    "{customer}-{env}-rds".to_string()
}

impl Default for EnvironmentManifest {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            rds_identifier: default_rds_identifier(),
            deployments: vec![
                ManifestDeployment {
                    name: "frontend-deployment".to_string(),
                    namespace: None,
                    health_url: "https://frontend-{env}-{customer}.example.com/healthz".to_string(),
                },
                ManifestDeployment {
                    name: "backend-deployment".to_string(),
                    namespace: None,
                    health_url: "https://backend-{env}-{customer}.example.com/healthz".to_string(),
                },
            ],
        }
    }
}

impl EnvironmentManifest {
    /// Load a manifest from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// RDS identifier with placeholders expanded
    pub fn rds_identifier(&self, customer: &str, environment: &str) -> String {
        expand(&self.rds_identifier, customer, environment)
    }

    /// Deployment specs with placeholders expanded, in manifest order
    pub fn deployments(&self, customer: &str, environment: &str) -> Vec<DeploymentSpec> {
        self.deployments
            .iter()
            .map(|d| {
                let namespace = d.namespace.as_deref().unwrap_or(&self.namespace);
                DeploymentSpec::new(
                    expand(&d.name, customer, environment),
                    expand(namespace, customer, environment),
                    expand(&d.health_url, customer, environment),
                )
            })
            .collect()
    }
}

fn expand(template: &str, customer: &str, environment: &str) -> String {
    template
        .replace("{customer}", customer)
        .replace("{env}", environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config() -> RunConfig {
        RunConfig {
            target: TargetConfig {
                cluster: "eks-dev".to_string(),
                customer: "acme".to_string(),
                environment: "qa".to_string(),
                rds_identifier: "acme-qa-rds".to_string(),
                deployments: vec![DeploymentSpec::new("web", "acme-qa", "https://x/healthz")],
            },
            aws: AwsConfig {
                region: "us-east-2".to_string(),
                state_bucket: "env-state".to_string(),
                state_region: "us-east-1".to_string(),
            },
            wait: WaitPolicy::default(),
            flags: RuntimeFlags::default(),
        }
    }

    #[test]
    fn default_wait_policy_matches_documented_timings() {
        let wait = WaitPolicy::default();
        assert_eq!(wait.poll_interval, Duration::from_secs(60));
        assert_eq!(wait.max_poll_attempts, 120);
        assert_eq!(wait.db_settle, Duration::from_secs(60));
        assert_eq!(wait.pod_drain, Duration::from_secs(60));
        assert_eq!(wait.app_warmup, Duration::from_secs(120));
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut c = config();
        c.aws.state_bucket = " ".to_string();
        assert!(matches!(c.validate(), Err(ConfigError::Empty("state_bucket"))));

        let mut c = config();
        c.target.deployments.clear();
        assert!(matches!(c.validate(), Err(ConfigError::NoDeployments)));

        let mut c = config();
        c.wait.max_poll_attempts = 0;
        assert!(matches!(c.validate(), Err(ConfigError::InvalidPollAttempts)));
    }

    #[test]
    fn validate_rejects_duplicate_deployments() {
        let mut c = config();
        c.target
            .deployments
            .push(DeploymentSpec::new("web", "other", "https://y/healthz"));
        assert!(matches!(
            c.validate(),
            Err(ConfigError::DuplicateDeployment(name)) if name == "web"
        ));
    }

    #[test]
    fn default_manifest_expands_placeholders() {
        let manifest = EnvironmentManifest::default();
        assert_eq!(manifest.rds_identifier("acme", "staging"), "acme-staging-rds");

        let deployments = manifest.deployments("acme", "staging");
        assert_eq!(
            deployments,
            vec![
                DeploymentSpec::new(
                    "frontend-deployment",
                    "acme-staging",
                    "https://frontend-staging-acme.example.com/healthz"
                ),
                DeploymentSpec::new(
                    "backend-deployment",
                    "acme-staging",
                    "https://backend-staging-acme.example.com/healthz"
                ),
            ]
        );
    }

    #[test]
    fn load_manifest_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "rds_identifier": "{{customer}}-{{env}}-postgres",
                "deployments": [
                    {{ "name": "api", "health_url": "https://api.{{env}}.example.com/health" }},
                    {{ "name": "jobs", "namespace": "batch", "health_url": "http://jobs.internal/ok" }}
                ]
            }}"#
        )
        .unwrap();

        let manifest = EnvironmentManifest::load(file.path()).unwrap();
        assert_eq!(manifest.rds_identifier("acme", "qa"), "acme-qa-postgres");

        let deployments = manifest.deployments("acme", "qa");
        assert_eq!(deployments[0].namespace, "acme-qa");
        assert_eq!(deployments[0].health_url, "https://api.qa.example.com/health");
        assert_eq!(deployments[1].namespace, "batch");
    }

    #[test]
    fn load_manifest_reports_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(matches!(
            EnvironmentManifest::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
