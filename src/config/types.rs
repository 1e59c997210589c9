//! Configuration type definitions for waitfor
//!
//! All types implement serde traits for JSON serialization and have sensible
//! defaults, so a config file only needs the fields it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::options::{
    Options, DEFAULT_ATTEMPTS, DEFAULT_INTERVAL, DEFAULT_JITTER, DEFAULT_MAX_INTERVAL,
    DEFAULT_MULTIPLIER,
};

/// Main configuration struct for waitfor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Retry behaviour applied to every resource
    pub retry: RetryConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

// ============================================================================
// Retry Configuration
// ============================================================================

/// Retry configuration, in the units users type on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Initial interval between attempts, in seconds.
    pub interval: u64,
    /// Cap on the interval between attempts, in seconds.
    pub max_interval: u64,
    /// Attempts per resource. 0 selects the default.
    pub attempts: u32,
    /// Interval growth factor.
    pub multiplier: f64,
    /// Randomization factor in `[0, 1]`.
    pub jitter: f64,
    /// Overall deadline for the whole wait, in seconds. `None` waits until
    /// attempts run out.
    pub timeout: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL.as_secs(),
            max_interval: DEFAULT_MAX_INTERVAL.as_secs(),
            attempts: DEFAULT_ATTEMPTS,
            multiplier: DEFAULT_MULTIPLIER,
            jitter: DEFAULT_JITTER,
            timeout: None,
        }
    }
}

impl RetryConfig {
    /// Snapshot these settings as per-call [`Options`].
    pub fn to_options(&self) -> Options {
        Options::default()
            .with_interval(Duration::from_secs(self.interval))
            .with_max_interval(Duration::from_secs(self.max_interval))
            .with_attempts(self.attempts)
            .with_multiplier(self.multiplier)
            .with_jitter(self.jitter)
    }

    /// The overall deadline, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line `LEVEL target message {fields}`.
    #[default]
    Compact,
    /// JSON lines for log aggregators.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. `info`, `waitfor=debug`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}
