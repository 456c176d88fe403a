//! Engine configuration loading and management.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::CoreError;
use crate::reason::{ExclusionPolicy, FailureReason};
use crate::types::Confidence;

/// Full configuration for the route confidence and exclusion engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Confidence aggregation settings.
    #[serde(default)]
    pub confidence: ConfidenceConfig,

    /// Failure-to-exclusion rule overrides.
    #[serde(default)]
    pub exclusion: ExclusionConfig,

    /// Retry loop settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    /// Confidence assumed for a forwarding node with no usable reputation.
    #[serde(default = "default_confidence")]
    pub default_confidence: Confidence,
    /// Upper bound on a single live per-hop query, in milliseconds. 0 disables it.
    #[serde(default = "default_hop_query_timeout_ms")]
    pub hop_query_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExclusionConfig {
    /// Per-reason policy overrides applied on top of the built-in table.
    #[serde(default)]
    pub rules: BTreeMap<FailureReason, ExclusionPolicy>,
    /// Reasons removed from the table; reports carrying them are rejected as
    /// unrecognized.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<FailureReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of payment attempts.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wall clock budget for the whole loop, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Candidates scoring below this are skipped. 0 disables the filter.
    #[serde(default)]
    pub min_confidence: Confidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_confidence() -> Confidence {
    Confidence::new(950_000)
}
fn default_hop_query_timeout_ms() -> u64 {
    5_000
}
fn default_max_attempts() -> u32 {
    10
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            default_confidence: default_confidence(),
            hop_query_timeout_ms: default_hop_query_timeout_ms(),
        }
    }
}

impl ConfidenceConfig {
    /// The per-hop query bound, if enabled.
    pub fn hop_query_timeout(&self) -> Option<Duration> {
        (self.hop_query_timeout_ms > 0).then(|| Duration::from_millis(self.hop_query_timeout_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            min_confidence: Confidence::ZERO,
        }
    }
}

impl RetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl EngineConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: EngineConfig = toml::from_str(&contents)?;
            config.validate()?;
            tracing::debug!(path = %path.display(), "loaded engine config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject settings that would make the engine unusable.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.retry.max_attempts == 0 {
            return Err(CoreError::Config("retry.max_attempts must be at least 1".into()));
        }
        let mut configured = self.exclusion.rules.keys().chain(&self.exclusion.disabled);
        if let Some(reason) = configured.find(|r| !r.is_recognized()) {
            return Err(CoreError::Config(format!(
                "exclusion rule for unknown failure reason: {}",
                reason
            )));
        }
        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(CoreError::Config(format!("unknown log format: {}", other))),
        }
    }
}
