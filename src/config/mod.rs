//! # Runplane Configuration System
//!
//! Layered configuration for the lifecycle control plane. Every section has
//! defaults, so an empty configuration directory yields a working setup;
//! files and environment variables only override what they name.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use runplane_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let timeout = manager.config().lifecycle.lock_timeout();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `runplane.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RunplaneConfig {
    /// Entity locking for lifecycle operations
    pub lifecycle: LifecycleConfig,

    /// Event bus sharding and backpressure
    pub events: EventsConfig,

    /// Framework status polling
    pub monitor: MonitorConfig,

    /// Post-transition processors
    pub processors: ProcessorsConfig,

    /// Log output
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub lock_timeout_seconds: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            lock_timeout_seconds: constants::DEFAULT_LOCK_TIMEOUT_SECONDS,
        }
    }
}

impl LifecycleConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Number of shard workers; events for one entity id always land on the same shard
    pub worker_shards: usize,
    /// Queue length per shard before publishers run handlers inline
    pub shard_queue_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            worker_shards: constants::DEFAULT_WORKER_SHARDS,
            shard_queue_capacity: constants::DEFAULT_SHARD_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    pub poll_interval_seconds: u64,
    /// Delay added per framework before its first poll
    pub stagger_seconds: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_seconds: constants::DEFAULT_MONITOR_POLL_INTERVAL_SECONDS,
            stagger_seconds: constants::DEFAULT_MONITOR_STAGGER_SECONDS,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_secs(self.stagger_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessorsConfig {
    pub transitions_history_limit: usize,
}

impl Default for ProcessorsConfig {
    fn default() -> Self {
        Self {
            transitions_history_limit: constants::DEFAULT_TRANSITIONS_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; falls back to an environment default when unset
    pub level: Option<String>,
    pub json: bool,
}

impl RunplaneConfig {
    /// Reject values that would stall or disable the control plane
    pub fn validate(&self) -> ConfigResult<()> {
        if self.lifecycle.lock_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "lifecycle.lock_timeout_seconds",
                "0",
                "lock timeout must be greater than zero",
            ));
        }
        if self.events.worker_shards == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.worker_shards",
                "0",
                "at least one shard worker is required",
            ));
        }
        if self.events.shard_queue_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.shard_queue_capacity",
                "0",
                "shard queues must hold at least one event",
            ));
        }
        if self.monitor.enabled && self.monitor.poll_interval_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "monitor.poll_interval_seconds",
                "0",
                "poll interval must be greater than zero when the monitor is enabled",
            ));
        }
        Ok(())
    }
}
