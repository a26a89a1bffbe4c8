//! envctl-coordinator - environment lifecycle orchestration
//!
//! Brings a customer environment (one RDS instance and its Kubernetes
//! deployments) up or down in a fixed order, refuses to repeat the same
//! action twice in a row, and records before/after snapshots in S3.

pub mod aws;
pub mod config;
pub mod error;
pub mod health;
pub mod k8s;
pub mod orchestrator;
pub mod report;
pub mod wait;

#[cfg(test)]
mod testing;
