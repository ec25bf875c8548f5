//! Logging configuration sourced from environment variables.

use std::env;

/// Configuration for the structured-logging subsystem.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"` or
    /// `"mirror_rules=debug,info"`.
    pub log_level: String,
    /// Emit JSON-formatted lines (for log-aggregator ingestion) instead of
    /// the human-readable text formatter.
    pub json_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl LoggingConfig {
    /// Builds a configuration from `MIRROR_LOG_LEVEL` / `MIRROR_LOG_JSON`,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = env::var("MIRROR_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(json) = env::var("MIRROR_LOG_JSON") {
            config.json_logs = json.eq_ignore_ascii_case("true") || json == "1";
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_text_info() {
        let config = LoggingConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }
}
