//! Progress reporting abstractions for the orchestrator
//!
//! The same lifecycle run can report to the console (CLI) or only to the
//! tracing log (tests, embedding).

use super::types::Phase;
use tracing::info;

/// Trait for reporting lifecycle progress
pub trait ProgressReporter: Send + Sync {
    /// Report a phase change
    fn phase(&self, phase: Phase);

    /// Report the outcome of a step with an optional JSON payload
    fn step(&self, label: &str, message: &str, data: Option<&serde_json::Value>);
}

/// Progress reporter that only logs via tracing
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn phase(&self, phase: Phase) {
        info!(phase = %phase, "Lifecycle phase");
    }

    fn step(&self, label: &str, message: &str, data: Option<&serde_json::Value>) {
        match data {
            Some(data) => info!(step = %label, data = %data, "{}", message),
            None => info!(step = %label, "{}", message),
        }
    }
}
