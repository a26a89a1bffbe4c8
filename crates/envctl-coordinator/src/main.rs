//! envctl: bring a customer environment up or down
//!
//! Every flag can also be supplied through the environment variables a CI
//! job exports (`ACTION`, `EKS_CLUSTER`, `BUILD_NUMBER`, ...).

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use envctl_common::defaults::{
    DEFAULT_APP_WARMUP_SECS, DEFAULT_DB_SETTLE_SECS, DEFAULT_HEALTH_CHECK_TIMEOUT_SECS,
    DEFAULT_POD_DRAIN_SECS, DEFAULT_RDS_MAX_POLL_ATTEMPTS, DEFAULT_RDS_POLL_INTERVAL_SECS,
};
use envctl_common::{ActionRecord, EnvAction};
use envctl_coordinator::aws::{AwsContext, RdsClient, S3Client, S3StateStore};
use envctl_coordinator::config::{
    AwsConfig, EnvironmentManifest, RunConfig, RuntimeFlags, TargetConfig, WaitPolicy,
};
use envctl_coordinator::health::HttpHealthProbe;
use envctl_coordinator::k8s::{K8sClient, update_kubeconfig};
use envctl_coordinator::orchestrator::{Adapters, LifecycleOrchestrator};
use envctl_coordinator::report::{self, ConsoleReporter};
use envctl_coordinator::wait::TokioSleeper;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "envctl")]
#[command(about = "Bring a customer environment (RDS + Kubernetes deployments) up or down")]
#[command(version)]
struct Args {
    /// Action to perform: up, down or get_env_state
    #[arg(long, env = "ACTION")]
    action: EnvAction,

    /// EKS cluster name
    #[arg(long, env = "EKS_CLUSTER")]
    cluster: String,

    /// AWS region of the cluster and database
    #[arg(long, env = "AWS_REGION")]
    region: String,

    /// CI build identifier, used as the history key
    #[arg(long, env = "BUILD_NUMBER")]
    build_id: String,

    /// User who triggered the build
    #[arg(long, env = "BUILD_USER", default_value = "")]
    user: String,

    /// Customer name
    #[arg(long, env = "CUSTOMER")]
    customer: String,

    /// Customer environment (e.g. "staging")
    #[arg(long, env = "ENVIRONMENT")]
    environment: String,

    /// S3 bucket holding environment history
    #[arg(long, env = "S3_BUCKET_NAME")]
    bucket: String,

    /// Region of the history bucket
    #[arg(long, env = "S3_REGION")]
    s3_region: String,

    /// JSON manifest listing the environment's deployments
    /// (default: frontend-deployment and backend-deployment)
    #[arg(long, env = "ENVCTL_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Override the RDS instance identifier from the manifest
    #[arg(long)]
    rds_identifier: Option<String>,

    /// Use the existing kubeconfig instead of refreshing it
    #[arg(long)]
    skip_kubeconfig: bool,

    /// Seconds between RDS status checks
    #[arg(long, default_value_t = DEFAULT_RDS_POLL_INTERVAL_SECS)]
    poll_interval: u64,

    /// Number of RDS status re-checks before giving up
    #[arg(long, default_value_t = DEFAULT_RDS_MAX_POLL_ATTEMPTS)]
    max_poll_attempts: u32,

    /// Seconds to wait after the database is available, before deployments are restored
    #[arg(long, default_value_t = DEFAULT_DB_SETTLE_SECS)]
    db_settle: u64,

    /// Seconds to wait after deployments are scaled down, before the database is stopped
    #[arg(long, default_value_t = DEFAULT_POD_DRAIN_SECS)]
    pod_drain: u64,

    /// Seconds to wait after deployments are restored
    #[arg(long, default_value_t = DEFAULT_APP_WARMUP_SECS)]
    app_warmup: u64,

    /// HTTP timeout for each health check, in seconds
    #[arg(long, default_value_t = DEFAULT_HEALTH_CHECK_TIMEOUT_SECS)]
    health_timeout: u64,
}

/// Strip the quotes CI tooling sometimes leaves around the user name
fn clean_user(user: &str) -> String {
    user.trim().trim_matches(|c| c == '"' || c == '\'').to_string()
}

impl Args {
    fn into_config(self) -> Result<(RunConfig, EnvAction, String, String)> {
        let manifest = match &self.manifest {
            Some(path) => EnvironmentManifest::load(path)?,
            None => EnvironmentManifest::default(),
        };
        let rds_identifier = self
            .rds_identifier
            .unwrap_or_else(|| manifest.rds_identifier(&self.customer, &self.environment));
        let deployments = manifest.deployments(&self.customer, &self.environment);

        let config = RunConfig {
            target: TargetConfig {
                cluster: self.cluster,
                customer: self.customer,
                environment: self.environment,
                rds_identifier,
                deployments,
            },
            aws: AwsConfig {
                region: self.region,
                state_bucket: self.bucket,
                state_region: self.s3_region,
            },
            wait: WaitPolicy {
                poll_interval: Duration::from_secs(self.poll_interval),
                max_poll_attempts: self.max_poll_attempts,
                db_settle: Duration::from_secs(self.db_settle),
                pod_drain: Duration::from_secs(self.pod_drain),
                app_warmup: Duration::from_secs(self.app_warmup),
            },
            flags: RuntimeFlags {
                skip_kubeconfig: self.skip_kubeconfig,
            },
        };
        config.validate()?;
        Ok((config, self.action, self.build_id, clean_user(&self.user)))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let health_timeout = Duration::from_secs(args.health_timeout);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                .add_directive("aws_config=warn".parse()?)
                .add_directive("aws_smithy_runtime=warn".parse()?)
                .add_directive("hyper=warn".parse()?)
                .add_directive("kube=warn".parse()?),
        )
        .init();

    let (config, action, build_id, user) = args.into_config()?;

    info!(
        action = %action,
        cluster = %config.target.cluster,
        customer = %config.target.customer,
        environment = %config.target.environment,
        rds = %config.target.rds_identifier,
        deployments = config.target.deployments.len(),
        build = %build_id,
        "Starting envctl"
    );

    if config.flags.skip_kubeconfig {
        info!("Skipping kubeconfig refresh");
    } else {
        update_kubeconfig(&config.target.cluster, &config.aws.region).await?;
    }

    let aws = AwsContext::new(&config.aws.region).await;
    let state_aws = AwsContext::new(&config.aws.state_region).await;
    debug!(
        region = aws.region(),
        state_region = state_aws.region(),
        "Loaded AWS configuration"
    );
    let adapters = Adapters {
        database: RdsClient::from_context(&aws),
        deployments: K8sClient::new().await?,
        health: HttpHealthProbe::new(health_timeout)?,
        store: S3StateStore::new(S3Client::from_context(&state_aws), &config.aws.state_bucket),
        sleeper: TokioSleeper,
    };

    let record = ActionRecord::new(
        Utc::now(),
        build_id,
        user,
        &config.target.customer,
        &config.target.environment,
        action,
    );
    let orchestrator = LifecycleOrchestrator::new(config, adapters);

    match orchestrator.run(record, &ConsoleReporter).await {
        Ok(summary) => {
            report::print_summary(&summary);
            Ok(())
        }
        Err(failure) => {
            report::print_failure(&failure);
            Err(failure).context(format!("'{action}' did not complete"))
        }
    }
}
