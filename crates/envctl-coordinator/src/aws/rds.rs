//! RDS instance lookup and start/stop

use crate::aws::context::AwsContext;
use crate::aws::error::classify_sdk_error;
use crate::error::{LifecycleError, Result};
use aws_sdk_rds::Client;
use envctl_common::DbLifecycleState;
use tracing::{debug, info};

const RESOURCE: &str = "RDS instance";

/// Trait for database instance operations that can be mocked in tests.
///
/// Implementations classify a missing instance as [`LifecycleError::NotFound`]
/// and every other failure as [`LifecycleError::Adapter`].
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait DatabaseOperations: Send + Sync {
    /// Current lifecycle state of the instance
    async fn describe(&self, identifier: &str) -> Result<DbLifecycleState>;

    /// Request an instance start (returns once AWS accepts the request)
    async fn start(&self, identifier: &str) -> Result<()>;

    /// Request an instance stop (returns once AWS accepts the request)
    async fn stop(&self, identifier: &str) -> Result<()>;
}

/// RDS client for a managed database instance
pub struct RdsClient {
    client: Client,
}

impl RdsClient {
    /// Create a new RDS client
    pub async fn new(region: &str) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Create an RDS client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.rds_client(),
        }
    }
}

impl DatabaseOperations for RdsClient {
    async fn describe(&self, identifier: &str) -> Result<DbLifecycleState> {
        let response = self
            .client
            .describe_db_instances()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(|e| {
                classify_sdk_error(&e).into_lifecycle(
                    RESOURCE,
                    identifier,
                    &format!("Failed to get RDS instance status for '{identifier}'"),
                )
            })?;

        let instance = response
            .db_instances()
            .first()
            .ok_or_else(|| LifecycleError::NotFound {
                resource: RESOURCE,
                id: identifier.to_string(),
            })?;

        let state = instance
            .db_instance_status()
            .map(DbLifecycleState::from)
            .unwrap_or_default();
        debug!(identifier = %identifier, state = %state, "Described RDS instance");
        Ok(state)
    }

    async fn start(&self, identifier: &str) -> Result<()> {
        info!(identifier = %identifier, "Starting RDS instance");
        self.client
            .start_db_instance()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(|e| {
                classify_sdk_error(&e).into_lifecycle(
                    RESOURCE,
                    identifier,
                    &format!("Failed to start RDS instance '{identifier}'"),
                )
            })?;
        Ok(())
    }

    async fn stop(&self, identifier: &str) -> Result<()> {
        info!(identifier = %identifier, "Stopping RDS instance");
        self.client
            .stop_db_instance()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(|e| {
                classify_sdk_error(&e).into_lifecycle(
                    RESOURCE,
                    identifier,
                    &format!("Failed to stop RDS instance '{identifier}'"),
                )
            })?;
        Ok(())
    }
}
