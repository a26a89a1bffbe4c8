//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use crate::error::LifecycleError;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories used to decide between `NotFound` and a plain adapter failure
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Convert into the lifecycle taxonomy.
    ///
    /// `resource` and `id` name the target for `NotFound`; `context` prefixes
    /// every other failure.
    pub fn into_lifecycle(self, resource: &'static str, id: &str, context: &str) -> LifecycleError {
        match self {
            AwsError::NotFound { .. } => LifecycleError::NotFound {
                resource,
                id: id.to_string(),
            },
            other => LifecycleError::adapter(context, other),
        }
    }
}

/// Known AWS error codes for "not found" conditions.
///
/// `NoSuchBucket` is not listed: a missing bucket is a configuration error.
const NOT_FOUND_CODES: &[&str] = &[
    "DBInstanceNotFound",
    "DBInstanceNotFoundFault",
    "NoSuchKey",
    "NotFound",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK operation error.
///
/// Service errors carry a code; transport and timeout failures do not and fall
/// through to [`AwsError::Sdk`] with the full error context as the message.
pub fn classify_sdk_error<E>(error: &E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error.code() {
        Some(code) => classify_aws_error(Some(code), error.message()),
        None => AwsError::Sdk {
            code: None,
            message: DisplayErrorContext(error).to_string(),
        },
    }
}
