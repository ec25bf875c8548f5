//! Oracle configuration (spec §6).
//!
//! Follows the `NodeConfig` pattern this workspace grew out of: a plain
//! `Default`-able struct with `with_*` builder methods, constructible
//! programmatically, from a TOML/JSON file, or layered with environment
//! overrides. Precedence is "explicit struct field > env var > default":
//! [`OracleConfig::from_env`] only overwrites a field the caller hasn't
//! already set away from its default.

use mirror_adapters::provider::Provider;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{env, fs};
use thiserror::Error;

/// Errors loading configuration from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path} as {format}: {message}")]
    Parse {
        path: String,
        format: &'static str,
        message: String,
    },
}

/// Recognized configuration options for one [`crate::Oracle`] instance
/// (spec §6 "Configuration").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleConfig {
    pub provider: Provider,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub fp_table_name: Option<String>,
    pub consent_table_name: Option<String>,
    pub block_counter_table_name: Option<String>,
    pub nonce_parameter_name: String,
    pub baseline_bucket: Option<String>,
    /// `provider = local` only: replaces the five table/bucket names
    /// above with one directory holding the five JSON collections.
    pub local_data_dir: String,
    pub strict_mode: bool,
    pub dry_run: bool,
    pub circuit_breaker_threshold: u64,
    pub nonce_ttl_ms: u64,
    pub byzantine_filter_percentile: f64,
    pub z_score_threshold: f64,
    pub k_anonymity_threshold: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Local,
            region: None,
            endpoint: None,
            fp_table_name: None,
            consent_table_name: None,
            block_counter_table_name: None,
            nonce_parameter_name: "oracle/nonce/v1".to_string(),
            baseline_bucket: None,
            local_data_dir: ".test-data".to_string(),
            strict_mode: false,
            dry_run: false,
            circuit_breaker_threshold: 100,
            nonce_ttl_ms: 3_600_000,
            byzantine_filter_percentile: 0.2,
            z_score_threshold: 3.0,
            k_anonymity_threshold: 10,
        }
    }
}

impl OracleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_local_data_dir(mut self, dir: impl Into<String>) -> Self {
        self.local_data_dir = dir.into();
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_circuit_breaker_threshold(mut self, threshold: u64) -> Self {
        self.circuit_breaker_threshold = threshold;
        self
    }

    /// Parses a `.toml` or `.json` config file (by extension) into an
    /// [`OracleConfig`]. Any field the file omits falls back to
    /// [`OracleConfig::default`] (not `self`) — the receiver only exists
    /// so this reads naturally as `OracleConfig::default().merge_from_file(path)`.
    pub fn merge_from_file(self, path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        if is_toml {
            toml::from_str(&text).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                format: "toml",
                message: e.to_string(),
            })
        } else {
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                format: "json",
                message: e.to_string(),
            })
        }
    }

    /// Layers `MIRROR_*` environment variable overrides on top of
    /// whatever this config already holds. Unset or unparsable
    /// variables leave the existing field untouched.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("MIRROR_PROVIDER") {
            if let Ok(provider) = v.parse() {
                self.provider = provider;
            }
        }
        if let Ok(v) = env::var("MIRROR_LOCAL_DATA_DIR") {
            self.local_data_dir = v;
        }
        if let Ok(v) = env::var("MIRROR_STRICT_MODE") {
            self.strict_mode = v.eq_ignore_ascii_case("true") || v == "1";
        }
        if let Ok(v) = env::var("MIRROR_DRY_RUN") {
            self.dry_run = v.eq_ignore_ascii_case("true") || v == "1";
        }
        if let Ok(v) = env::var("MIRROR_CIRCUIT_BREAKER_THRESHOLD") {
            if let Ok(n) = v.parse() {
                self.circuit_breaker_threshold = n;
            }
        }
        if let Ok(v) = env::var("MIRROR_NONCE_PARAMETER_NAME") {
            self.nonce_parameter_name = v;
        }
        if let Ok(v) = env::var("MIRROR_REGION") {
            self.region = Some(v);
        }
        if let Ok(v) = env::var("MIRROR_ENDPOINT") {
            self.endpoint = Some(v);
        }
        self
    }
}
