//! In-memory adapters for orchestration tests
//!
//! Unlike the mockall mocks, these fakes keep state between calls and append
//! every mutating call to a shared [`Journal`], so a test can assert the exact
//! order of database, deployment and wait operations across adapters.

use crate::aws::{DatabaseOperations, StateStore};
use crate::config::{AwsConfig, DeploymentSpec, RunConfig, RuntimeFlags, TargetConfig, WaitPolicy};
use crate::error::{LifecycleError, Result};
use crate::health::{HealthCheck, HealthProbe};
use crate::k8s::{DeploymentOperations, DeploymentStatus};
use crate::wait::Sleeper;
use chrono::TimeZone;
use envctl_common::paths::object_key;
use envctl_common::{ActionRecord, AppStatus, DbLifecycleState, EnvAction};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mutating call observed by one of the fakes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    StartDb,
    StopDb,
    SetReplicas(String, i32),
    Wait(u64),
}

pub type Journal = Arc<Mutex<Vec<Call>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(journal: &Journal) -> Vec<Call> {
    journal.lock().unwrap().clone()
}

pub const CLUSTER: &str = "eks-dev";
pub const CUSTOMER: &str = "acme";
pub const ENVIRONMENT: &str = "qa";
pub const RDS_ID: &str = "acme-qa-rds";
pub const LATEST_PATH: &str = "/eks-dev/acme/qa";

/// Run configuration with two deployments and the default wait policy
pub fn run_config() -> RunConfig {
    RunConfig {
        target: TargetConfig {
            cluster: CLUSTER.to_string(),
            customer: CUSTOMER.to_string(),
            environment: ENVIRONMENT.to_string(),
            rds_identifier: RDS_ID.to_string(),
            deployments: vec![
                DeploymentSpec::new(
                    "frontend-deployment",
                    "acme-qa",
                    "https://frontend-qa-acme.example.com/healthz",
                ),
                DeploymentSpec::new(
                    "backend-deployment",
                    "acme-qa",
                    "https://backend-qa-acme.example.com/healthz",
                ),
            ],
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

/// Action record for `build` at a fixed instant
pub fn action_record(action: EnvAction, build: &str) -> ActionRecord {
    let at = chrono::Utc
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .unwrap();
    ActionRecord::new(at, build, "jdoe", CUSTOMER, ENVIRONMENT, action)
}

/// State store keeping documents in memory, keyed like S3 object keys
#[derive(Default)]
pub struct InMemoryStateStore {
    docs: Mutex<HashMap<String, serde_json::Value>>,
}

impl InMemoryStateStore {
    pub fn get(&self, path: &str, file_name: &str) -> Option<serde_json::Value> {
        self.docs
            .lock()
            .unwrap()
            .get(&object_key(path, file_name))
            .cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.docs.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl StateStore for InMemoryStateStore {
    async fn load(&self, path: &str, file_name: &str) -> Result<serde_json::Value> {
        let key = object_key(path, file_name);
        self.docs
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(LifecycleError::NotFound {
                resource: "S3 object",
                id: key,
            })
    }

    async fn save(&self, path: &str, file_name: &str, data: &serde_json::Value) -> Result<()> {
        self.docs
            .lock()
            .unwrap()
            .insert(object_key(path, file_name), data.clone());
        Ok(())
    }
}

/// Database whose start/stop complete instantly
pub struct FakeDatabase {
    state: Mutex<DbLifecycleState>,
    journal: Journal,
    failing: AtomicBool,
}

impl FakeDatabase {
    pub fn new(state: DbLifecycleState, journal: Journal) -> Self {
        Self {
            state: Mutex::new(state),
            journal,
            failing: AtomicBool::new(false),
        }
    }

    /// Make `start` and `stop` fail without changing state
    pub fn fail_transitions(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check_failing(&self, op: &str, identifier: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LifecycleError::adapter(
                format!("Failed to {op} RDS instance '{identifier}'"),
                "InvalidDBInstanceState",
            ));
        }
        Ok(())
    }

    pub fn state(&self) -> DbLifecycleState {
        self.state.lock().unwrap().clone()
    }
}

impl DatabaseOperations for FakeDatabase {
    async fn describe(&self, _identifier: &str) -> Result<DbLifecycleState> {
        Ok(self.state())
    }

    async fn start(&self, identifier: &str) -> Result<()> {
        self.check_failing("start", identifier)?;
        self.journal.lock().unwrap().push(Call::StartDb);
        *self.state.lock().unwrap() = DbLifecycleState::Available;
        Ok(())
    }

    async fn stop(&self, identifier: &str) -> Result<()> {
        self.check_failing("stop", identifier)?;
        self.journal.lock().unwrap().push(Call::StopDb);
        *self.state.lock().unwrap() = DbLifecycleState::Stopped;
        Ok(())
    }
}

/// Deployments held in memory; names not present do not exist
pub struct FakeDeployments {
    deployments: Mutex<BTreeMap<String, DeploymentStatus>>,
    journal: Journal,
    fail_on: Option<String>,
}

impl FakeDeployments {
    pub fn new(journal: Journal) -> Self {
        Self {
            deployments: Mutex::new(BTreeMap::new()),
            journal,
            fail_on: None,
        }
    }

    pub fn with(self, name: &str, replicas: i32) -> Self {
        self.deployments
            .lock()
            .unwrap()
            .insert(name.to_string(), running(replicas));
        self
    }

    /// Make `set_replicas` fail for `name`
    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_string());
        self
    }

    pub fn replicas(&self, name: &str) -> Option<i32> {
        self.deployments
            .lock()
            .unwrap()
            .get(name)
            .and_then(|d| d.replica_count)
    }
}

fn running(replicas: i32) -> DeploymentStatus {
    DeploymentStatus {
        exists: true,
        available: Some(replicas > 0),
        available_reason: (replicas > 0).then(|| "MinimumReplicasAvailable".to_string()),
        replica_count: Some(replicas),
    }
}

impl DeploymentOperations for FakeDeployments {
    async fn get_status(&self, name: &str, _namespace: &str) -> Result<DeploymentStatus> {
        Ok(self
            .deployments
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(DeploymentStatus::missing))
    }

    async fn set_replicas(&self, name: &str, namespace: &str, replicas: i32) -> Result<()> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(LifecycleError::adapter(
                format!("API error while updating deployment '{name}'"),
                "Forbidden (HTTP 403)",
            ));
        }
        self.journal
            .lock()
            .unwrap()
            .push(Call::SetReplicas(name.to_string(), replicas));

        let mut deployments = self.deployments.lock().unwrap();
        match deployments.get_mut(name) {
            Some(d) => {
                *d = running(replicas);
                Ok(())
            }
            None => Err(LifecycleError::NotFound {
                resource: "deployment",
                id: format!("{namespace}/{name}"),
            }),
        }
    }
}

/// Health probe reporting the same status for every URL
pub struct StaticHealth(pub AppStatus);

impl HealthProbe for StaticHealth {
    async fn check(&self, url: &str) -> Result<HealthCheck> {
        Ok(HealthCheck {
            status: self.0,
            message: format!("{url} is {}", self.0),
        })
    }
}

/// Sleeper that records the wait instead of sleeping
pub struct RecordingSleeper {
    journal: Journal,
}

impl RecordingSleeper {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.journal
            .lock()
            .unwrap()
            .push(Call::Wait(duration.as_secs()));
    }
}
