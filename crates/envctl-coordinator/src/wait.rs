//! Fixed-interval waiting.
//!
//! Every suspension in a lifecycle run (RDS polling intervals and the settle,
//! drain and warm-up periods) goes through a [`Sleeper`], so tests can count
//! and order waits without sleeping. Waits are not cancellable; stopping a run
//! mid-wait means killing the process.

use std::time::Duration;
use tracing::info;

/// Suspends the current run for a fixed duration.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Wait a fixed period so an asynchronous system can reach a stable condition.
///
/// `reason` completes the sentence "Waiting N seconds for ...".
pub async fn pause<W: Sleeper>(sleeper: &W, duration: Duration, reason: &str) {
    info!(seconds = duration.as_secs(), "Waiting {} seconds for {}", duration.as_secs(), reason);
    sleeper.sleep(duration).await;
}
