//! # System Constants
//!
//! Defaults and fixed names shared across the lifecycle control plane.

/// Seconds a lifecycle operation waits for an entity lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT_SECONDS: u64 = 30;

/// Number of shard workers consuming bus events.
pub const DEFAULT_WORKER_SHARDS: usize = 4;

/// Bounded queue length per shard before the publisher runs the handler itself.
pub const DEFAULT_SHARD_QUEUE_CAPACITY: usize = 256;

pub const DEFAULT_MONITOR_POLL_INTERVAL_SECONDS: u64 = 60;
pub const DEFAULT_MONITOR_STAGGER_SECONDS: u64 = 5;

/// Maximum number of entries kept in a status transition history.
pub const DEFAULT_TRANSITIONS_HISTORY_LIMIT: usize = 50;

/// Prefix of processor stage keys (`RUNNING` -> `onRunning`).
pub const STAGE_PREFIX: &str = "on";

/// Separator between the runtime name and the run/task flavour in a kind
/// string (`python+run`).
pub const KIND_SEPARATOR: char = '+';

/// Suffix of run kinds derived from a task kind.
pub const RUN_KIND_SUFFIX: &str = "run";

/// Entity kinds used in events, errors and log records.
pub mod entities {
    pub const RUN: &str = "run";
    pub const TRIGGER: &str = "trigger";
    pub const TASK: &str = "task";
}

/// Environment variables consulted during start-up.
pub mod env {
    pub const ENVIRONMENT: &str = "RUNPLANE_ENV";
    pub const ENVIRONMENT_FALLBACK: &str = "APP_ENV";
    pub const CONFIG_DIR: &str = "RUNPLANE_CONFIG_DIR";
    pub const CONFIG_PREFIX: &str = "RUNPLANE";
}
