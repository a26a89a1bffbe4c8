//! HTTP health probing of application endpoints

use crate::error::{LifecycleError, Result};
use anyhow::Context;
use envctl_common::AppStatus;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Outcome of one health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: AppStatus,
    pub message: String,
}

impl HealthCheck {
    fn up(message: impl Into<String>) -> Self {
        Self {
            status: AppStatus::Up,
            message: message.into(),
        }
    }

    fn down(message: impl Into<String>) -> Self {
        Self {
            status: AppStatus::Down,
            message: message.into(),
        }
    }
}

/// Trait for probing an application endpoint that can be mocked in tests.
///
/// A timeout or a non-200 response is `Down`. Connection, DNS and other
/// transport failures are errors, as is a URL that cannot be probed at all.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait HealthProbe: Send + Sync {
    async fn check(&self, url: &str) -> Result<HealthCheck>;
}

/// Health probe issuing a single GET per check
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for health checks")?;
        Ok(Self { client })
    }
}

fn parse_health_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| LifecycleError::Validation(format!("invalid health check URL '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(LifecycleError::Validation(format!(
            "unsupported scheme '{scheme}' in health check URL '{url}'"
        ))),
    }
}

fn describe_failure(e: &reqwest::Error) -> &'static str {
    if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    }
}

impl HealthProbe for HttpHealthProbe {
    async fn check(&self, url: &str) -> Result<HealthCheck> {
        let parsed = parse_health_url(url)?;

        let check = match self.client.get(parsed).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                HealthCheck::up(format!("{url} is up"))
            }
            Ok(response) => HealthCheck::down(format!(
                "{url} is down with HTTP status code {}",
                response.status().as_u16()
            )),
            Err(e) if e.is_timeout() => HealthCheck::down(format!("{url} is down: timed out")),
            Err(e) => {
                return Err(LifecycleError::adapter(
                    format!("Health check for '{url}' {}", describe_failure(&e)),
                    e,
                ));
            }
        };

        debug!(url = %url, status = %check.status, "Health check finished");
        Ok(check)
    }
}
