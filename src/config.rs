//! Configuration for the frameflow pipeline
//!
//! This module contains the recognized configuration surface of the
//! generator and TOML load/save helpers for it.
//!
//! # Options
//!
//! - `producer_timeout_ms` - producer tick period, 0 disables periodic firing
//! - `processor_minimum_sleep_ms` / `processor_max_random_sleep_ms` - shape of
//!   the simulated processing latency
//! - `max_parallelism` - concurrent processing cap (effective minimum 1)
//! - `max_queue_view_size` - capacity of the diagnostic view buffer

use crate::error::{FrameFlowError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default producer tick period in milliseconds
pub const DEFAULT_PRODUCER_TIMEOUT_MS: u64 = 500;

/// Default fixed part of the simulated processing sleep in milliseconds
pub const DEFAULT_PROCESSOR_MINIMUM_SLEEP_MS: u64 = 2000;

/// Default random part of the simulated processing sleep in milliseconds
pub const DEFAULT_PROCESSOR_MAX_RANDOM_SLEEP_MS: u64 = 4000;

/// Default concurrent processing cap
pub const DEFAULT_MAX_PARALLELISM: usize = 4;

/// Default view buffer capacity
pub const DEFAULT_MAX_QUEUE_VIEW_SIZE: usize = 5;

/// Configuration of the producer/consumer generator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Producer data creation time rate [ms]. 0 disables periodic firing.
    pub producer_timeout_ms: u64,

    /// Processing simulation fixed sleep time [ms]
    pub processor_minimum_sleep_ms: u64,

    /// Processing simulation random sleep time [ms]
    pub processor_max_random_sleep_ms: u64,

    /// Consumer max parallelism degree
    pub max_parallelism: usize,

    /// Number of recent frames retained for visualization
    pub max_queue_view_size: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            producer_timeout_ms: DEFAULT_PRODUCER_TIMEOUT_MS,
            processor_minimum_sleep_ms: DEFAULT_PROCESSOR_MINIMUM_SLEEP_MS,
            processor_max_random_sleep_ms: DEFAULT_PROCESSOR_MAX_RANDOM_SLEEP_MS,
            max_parallelism: DEFAULT_MAX_PARALLELISM,
            max_queue_view_size: DEFAULT_MAX_QUEUE_VIEW_SIZE,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&text)
            .map_err(|e| FrameFlowError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| FrameFlowError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Fixed part of the simulated processing sleep
    pub fn processor_minimum_sleep(&self) -> Duration {
        Duration::from_millis(self.processor_minimum_sleep_ms)
    }

    /// Random part of the simulated processing sleep
    pub fn processor_max_random_sleep(&self) -> Duration {
        Duration::from_millis(self.processor_max_random_sleep_ms)
    }

    /// Effective parallelism cap, never below one
    pub fn effective_parallelism(&self) -> usize {
        self.max_parallelism.max(1)
    }
}
