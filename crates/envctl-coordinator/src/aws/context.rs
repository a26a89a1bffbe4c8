//! Region-scoped AWS configuration
//!
//! An environment's RDS instance sits in the cluster's region while the state
//! bucket may sit elsewhere, so `envctl` loads one `AwsContext` per region.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

/// SDK configuration loaded for one region.
///
/// ```ignore
/// let cluster = AwsContext::new(&config.aws.region).await;
/// let state = AwsContext::new(&config.aws.state_region).await;
///
/// let rds = RdsClient::from_context(&cluster);
/// let s3 = S3Client::from_context(&state);
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Resolve credentials from the default provider chain and pin `region`.
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// RDS client for the instance's region
    pub fn rds_client(&self) -> aws_sdk_rds::Client {
        aws_sdk_rds::Client::new(&self.config)
    }

    /// S3 client for the state bucket's region
    pub fn s3_client(&self) -> aws_sdk_s3::Client {
        aws_sdk_s3::Client::new(&self.config)
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
