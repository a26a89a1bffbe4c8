//! Default timing values for environment transitions
//!
//! Database transitions are vendor-managed and asynchronous, so every wait in
//! the lifecycle is a fixed interval rather than an event.

/// Interval between RDS status checks while polling (seconds)
pub const DEFAULT_RDS_POLL_INTERVAL_SECS: u64 = 60;

/// Maximum number of RDS status checks before giving up (2 hours at 60s)
pub const DEFAULT_RDS_MAX_POLL_ATTEMPTS: u32 = 120;

/// Wait after the database is available before restoring deployments (seconds)
pub const DEFAULT_DB_SETTLE_SECS: u64 = 60;

/// Wait after deployments are scaled to zero before stopping the database (seconds)
pub const DEFAULT_POD_DRAIN_SECS: u64 = 60;

/// Wait after deployments are restored for application endpoints to come up (seconds)
pub const DEFAULT_APP_WARMUP_SECS: u64 = 120;

/// HTTP timeout for a single application health check (seconds)
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;
