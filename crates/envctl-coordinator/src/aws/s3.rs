//! S3 object access and the JSON state store built on it

use crate::aws::context::AwsContext;
use crate::aws::error::classify_sdk_error;
use crate::error::{LifecycleError, Result};
use aws_sdk_s3::{Client, primitives::ByteStream};
use envctl_common::paths::object_key;
use tracing::{debug, info};

/// Trait for durable JSON document storage that can be mocked in tests.
///
/// A missing document is reported as [`LifecycleError::NotFound`] so callers
/// can tell "no history yet" apart from a storage failure.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait StateStore: Send + Sync {
    /// Load the JSON document `file_name` under `path`
    async fn load(&self, path: &str, file_name: &str) -> Result<serde_json::Value>;

    /// Write (or overwrite) the JSON document `file_name` under `path`
    async fn save(&self, path: &str, file_name: &str, data: &serde_json::Value) -> Result<()>;
}

/// S3 client for reading and writing state objects
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create a new S3 client
    pub async fn new(region: &str) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Create an S3 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }

    /// Upload bytes to S3
    pub async fn upload_bytes(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        debug!(bucket = %bucket, key = %key, size = data.len(), "Uploading bytes");

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                classify_sdk_error(&e).into_lifecycle(
                    "S3 bucket",
                    bucket,
                    &format!("Failed to write S3 object '{key}'"),
                )
            })?;

        Ok(())
    }

    /// Download an object's bytes from S3
    pub async fn download_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        debug!(bucket = %bucket, key = %key, "Downloading object");

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                classify_sdk_error(&e).into_lifecycle(
                    "S3 object",
                    &format!("s3://{bucket}/{key}"),
                    &format!("Failed to access S3 object '{key}'"),
                )
            })?;

        let body = response.body.collect().await.map_err(|e| {
            LifecycleError::adapter(format!("Failed to read S3 object '{key}'"), e)
        })?;

        Ok(body.into_bytes().to_vec())
    }
}

/// State store backed by a single S3 bucket
pub struct S3StateStore {
    s3: S3Client,
    bucket: String,
}

impl S3StateStore {
    pub fn new(s3: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            s3,
            bucket: bucket.into(),
        }
    }
}

fn require_file_name(file_name: &str) -> Result<()> {
    if file_name.is_empty() {
        return Err(LifecycleError::Validation(
            "state file name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

impl StateStore for S3StateStore {
    async fn load(&self, path: &str, file_name: &str) -> Result<serde_json::Value> {
        require_file_name(file_name)?;
        let key = object_key(path, file_name);

        let bytes = self.s3.download_bytes(&self.bucket, &key).await?;
        let data = serde_json::from_slice(&bytes).map_err(|source| LifecycleError::Json {
            op: "decode",
            what: format!("S3 object '{key}'"),
            source,
        })?;

        info!(bucket = %self.bucket, key = %key, "Loaded state file");
        Ok(data)
    }

    async fn save(&self, path: &str, file_name: &str, data: &serde_json::Value) -> Result<()> {
        require_file_name(file_name)?;
        let key = object_key(path, file_name);

        let body = serde_json::to_vec_pretty(data).map_err(|source| LifecycleError::Json {
            op: "encode",
            what: format!("S3 object '{key}'"),
            source,
        })?;

        self.s3
            .upload_bytes(&self.bucket, &key, body, "application/json")
            .await?;

        info!(bucket = %self.bucket, key = %key, "Recorded state file");
        Ok(())
    }
}
