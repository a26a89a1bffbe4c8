//! RDS integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_rds_integration -- --ignored
//! ```
//!
//! Only read-only calls are made.


use aws_test_helpers::*;
use envctl_coordinator::aws::{DatabaseOperations, RdsClient};

/// Describing an instance that does not exist is NotFound
#[tokio::test]
#[ignore]
async fn test_describe_missing_instance() {
    let client = RdsClient::new(&get_test_region()).await;
    let identifier = format!("envctl-{}", test_run_id());

    let err = client
        .describe(&identifier)
        .await
        .expect_err("Instance should not exist");
    assert!(err.is_not_found(), "unexpected error: {err}");
}

/// Describing an existing instance returns a lifecycle state
#[tokio::test]
#[ignore]
async fn test_describe_existing_instance() {
    let Ok(identifier) = std::env::var("ENVCTL_TEST_RDS") else {
        eprintln!("ENVCTL_TEST_RDS not set, skipping");
        return;
    };
    let client = RdsClient::new(&get_test_region()).await;

    let state = client
        .describe(&identifier)
        .await
        .expect("Should describe instance");
    assert!(!state.as_str().is_empty());
}
