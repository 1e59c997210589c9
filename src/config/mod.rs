//! Configuration management for waitfor
//!
//! Settings are layered: built-in defaults, then an optional JSON file
//! (`~/.waitfor/config.json` unless a path is given), then `WAITFOR_*`
//! environment variables. Command-line flags are applied on top by the CLI.

mod types;

pub use types::*;

use std::path::{Path, PathBuf};

use crate::error::{Result, WaitError};

impl Config {
    /// Returns the waitfor configuration directory path (~/.waitfor)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".waitfor")
    }

    /// Returns the path to the default config file (~/.waitfor/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| {
                WaitError::Config(format!("cannot parse {}: {}", path.display(), e))
            })?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables follow the pattern: WAITFOR_KEY
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` in place of the process environment.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("WAITFOR_INTERVAL").and_then(|v| v.parse().ok()) {
            self.retry.interval = v;
        }
        if let Some(v) = lookup("WAITFOR_MAX_INTERVAL").and_then(|v| v.parse().ok()) {
            self.retry.max_interval = v;
        }
        if let Some(v) = lookup("WAITFOR_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.retry.attempts = v;
        }
        if let Some(v) = lookup("WAITFOR_MULTIPLIER").and_then(|v| v.parse().ok()) {
            self.retry.multiplier = v;
        }
        if let Some(v) = lookup("WAITFOR_JITTER").and_then(|v| v.parse().ok()) {
            self.retry.jitter = v;
        }
        if let Some(v) = lookup("WAITFOR_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.retry.timeout = Some(v);
        }

        // Logging
        if let Some(v) = lookup("WAITFOR_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("WAITFOR_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            self.logging.format = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.retry.interval, 5);
        assert_eq!(config.retry.max_interval, 60);
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.multiplier, 1.5);
        assert_eq!(config.retry.jitter, 0.5);
        assert!(config.retry.timeout.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{"retry": {"attempts": 12}, "logging": {"format": "json"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.retry.attempts, 12);
        // Defaults should apply to unspecified fields
        assert_eq!(config.retry.interval, 5);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_to_options() {
        let retry = RetryConfig {
            interval: 2,
            max_interval: 30,
            attempts: 0,
            multiplier: 2.0,
            jitter: 0.1,
            timeout: Some(90),
        };
        let opts = retry.to_options();
        assert_eq!(opts.interval(), Duration::from_secs(2));
        assert_eq!(opts.max_interval(), Duration::from_secs(30));
        assert_eq!(opts.attempts(), 5);
        assert_eq!(opts.multiplier(), 2.0);
        assert_eq!(opts.jitter(), 0.1);
        assert_eq!(retry.timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[
            ("WAITFOR_INTERVAL", "1"),
            ("WAITFOR_MAX_INTERVAL", "10"),
            ("WAITFOR_ATTEMPTS", "20"),
            ("WAITFOR_MULTIPLIER", "2.5"),
            ("WAITFOR_JITTER", "0"),
            ("WAITFOR_TIMEOUT", "120"),
            ("WAITFOR_LOG_LEVEL", "debug"),
            ("WAITFOR_LOG_FORMAT", "pretty"),
        ]));

        assert_eq!(config.retry.interval, 1);
        assert_eq!(config.retry.max_interval, 10);
        assert_eq!(config.retry.attempts, 20);
        assert_eq!(config.retry.multiplier, 2.5);
        assert_eq!(config.retry.jitter, 0.0);
        assert_eq!(config.retry.timeout, Some(120));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_unparsable_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[
            ("WAITFOR_ATTEMPTS", "many"),
            ("WAITFOR_LOG_FORMAT", "xml"),
        ]));
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_load_from_missing_path_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.retry, RetryConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"retry": {"interval": 3, "timeout": 45}}"#).unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.retry.interval, 3);
        assert_eq!(config.retry.timeout, Some(45));
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, WaitError::Config(_)));
        assert!(err.to_string().contains("cannot parse"));
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
