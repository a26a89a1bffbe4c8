//! AWS client modules for the coordinator
//!
//! This module provides wrappers around AWS SDK clients for:
//! - RDS: Database instance status and start/stop
//! - S3: Durable storage for environment snapshots and action history

pub mod context;
pub mod error;
pub mod rds;
pub mod s3;

pub use context::AwsContext;
pub use error::{AwsError, classify_aws_error, classify_sdk_error};
pub use rds::{DatabaseOperations, RdsClient};
pub use s3::{S3Client, S3StateStore, StateStore};

#[cfg(test)]
pub use rds::MockDatabaseOperations;
#[cfg(test)]
pub use s3::MockStateStore;
