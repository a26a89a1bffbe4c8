//! Labeled console reports
//!
//! Each step prints a bold label followed by a `{success, message, data}`
//! JSON envelope, so CI logs show the same structure for successes and
//! failures.

use crate::orchestrator::{OrchestrationReport, Phase, PhaseFailure, ProgressReporter};
use serde::Serialize;
use std::io::Write;

const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[1;32m";
const RED: &str = "\x1b[1;31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Result envelope printed for every step
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub success: bool,
    pub message: &'a str,
    pub data: Option<&'a serde_json::Value>,
}

/// Render one labeled report block
pub fn render(label: &str, envelope: &Envelope<'_>) -> String {
    let color = if envelope.success { GREEN } else { RED };
    let body = serde_json::to_string_pretty(envelope)
        .unwrap_or_else(|e| format!("{{\"success\": false, \"message\": \"unprintable report: {e}\"}}"));
    format!("{color}{label}{RESET}\n{body}\n")
}

/// Progress reporter printing to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn phase(&self, phase: Phase) {
        println!("{BOLD}==> {phase}{RESET}");
    }

    fn step(&self, label: &str, message: &str, data: Option<&serde_json::Value>) {
        let envelope = Envelope {
            success: true,
            message,
            data,
        };
        println!("{}", render(label, &envelope));
    }
}

/// Envelope data describing a failed run
pub fn failure_data(failure: &PhaseFailure) -> serde_json::Value {
    serde_json::json!({
        "phase": failure.phase,
        "kind": failure.error.kind(),
    })
}

/// Print a failed run to stderr
pub fn print_failure(failure: &PhaseFailure) {
    let message = failure.error.to_string();
    let data = failure_data(failure);
    let envelope = Envelope {
        success: false,
        message: &message,
        data: Some(&data),
    };

    let mut stderr = std::io::stderr();
    let _ = writeln!(
        stderr,
        "{}",
        render(&format!("ERROR in {}", failure.phase), &envelope)
    );
}

/// Print the one-line summary of a successful run
pub fn print_summary(report: &OrchestrationReport) {
    let detail = match (&report.apply, &report.recorded) {
        (Some(apply), Some(record)) => format!(
            "RDS '{}' {} -> {}, {} deployment(s) scaled, build {} recorded",
            apply.database.identifier,
            apply.database.from,
            apply.database.to,
            apply.scaled.len(),
            record.build_id
        ),
        _ => format!(
            "RDS '{}' is '{}'",
            report.pre_state.database_instance.identifier,
            report.pre_state.database_instance.lifecycle_state
        ),
    };
    println!(
        "{GREEN}Action '{}' completed{RESET} {DIM}{detail}{RESET}",
        report.action
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LifecycleError;
    use envctl_common::EnvAction;

    #[test]
    fn render_includes_label_and_envelope() {
        let data = serde_json::json!({ "rds_state": "available" });
        let out = render(
            "PRE-ACTION STATE",
            &Envelope {
                success: true,
                message: "ok",
                data: Some(&data),
            },
        );
        assert!(out.contains("PRE-ACTION STATE"));
        assert!(out.contains("\"success\": true"));
        assert!(out.contains("\"rds_state\": \"available\""));
    }

    #[test]
    fn failure_data_names_phase_and_kind() {
        let failure = PhaseFailure::new(
            Phase::CheckingGuard,
            LifecycleError::ConsecutiveAction {
                action: EnvAction::Up,
            },
        );
        let data = failure_data(&failure);
        assert_eq!(data["phase"], "CheckingGuard");
        assert_eq!(data["kind"], "ConsecutiveActionError");
    }
}
