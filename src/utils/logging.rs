//! Logging initialization for waitfor.
//!
//! Supports three formats:
//! - `pretty`: multi-line human-readable output
//! - `compact`: `LEVEL target message {fields}`, grep-friendly (default)
//! - `json`: structured JSON lines for log aggregators
//!
//! Logs go to stderr so the gated program's output on stdout stays clean.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Build the filter: `RUST_LOG` wins, otherwise `cfg.level`.
pub fn env_filter(cfg: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted. Later
/// calls are ignored.
pub fn init_logging(cfg: &LoggingConfig) {
    let filter = env_filter(cfg);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = match cfg.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_logging_config() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.format, LogFormat::Compact);
        assert_eq!(cfg.level, "info");
    }

    #[test]
    fn test_log_format_deserialize_json() {
        let cfg: LoggingConfig =
            serde_json::from_str(r#"{"format":"json","level":"debug"}"#).unwrap();
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.level, "debug");
    }

    #[test]
    fn test_log_format_partial_config_uses_defaults() {
        let cfg: LoggingConfig = serde_json::from_str(r#"{"level":"trace"}"#).unwrap();
        assert_eq!(cfg.format, LogFormat::Compact);
        assert_eq!(cfg.level, "trace");
    }

    #[test]
    fn test_invalid_level_falls_back() {
        let cfg = LoggingConfig {
            level: "[[not a directive".to_string(),
            format: LogFormat::Compact,
        };
        // Must not panic.
        let _ = env_filter(&cfg);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let cfg = LoggingConfig::default();
        init_logging(&cfg);
        init_logging(&cfg);
    }
}
