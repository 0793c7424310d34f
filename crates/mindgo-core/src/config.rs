//! Configuration for the flow runtime
//!
//! Values come from defaults, an optional YAML file and environment variables,
//! in that order of precedence.

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound accepted for the auto-advance delay
pub const MAX_AUTO_ADVANCE_DELAY_MS: u64 = 10_000;

/// Flow runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Advance automatically after an option is selected
    #[serde(default = "default_auto_advance_enabled")]
    pub auto_advance_enabled: bool,

    /// Delay before the automatic advance
    #[serde(default = "default_auto_advance_delay_ms")]
    pub auto_advance_delay_ms: u64,

    /// Ignore a manual "Next" that arrives within one delay of an automatic advance
    #[serde(default = "default_absorb_racing_next")]
    pub absorb_racing_next: bool,

    /// Collection results are appended to when the flow names none
    #[serde(default = "default_results_collection")]
    pub results_collection: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_auto_advance_enabled() -> bool {
    true
}

fn default_auto_advance_delay_ms() -> u64 {
    350
}

fn default_absorb_racing_next() -> bool {
    true
}

fn default_results_collection() -> String {
    "assessments".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl FlowConfig {
    /// Load configuration from defaults and environment variables
    pub fn load() -> Result<Self, CoreError> {
        let mut config = Self::default();
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;

        info!(
            auto_advance = config.auto_advance_enabled,
            delay_ms = config.auto_advance_delay_ms,
            collection = %config.results_collection,
            "Loaded flow configuration"
        );
        Ok(config)
    }

    /// Parse a YAML document; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CoreError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Apply `MINDGO_*` and `LOG_LEVEL` overrides using `lookup` to read variables
    ///
    /// Unparsable values are logged and ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(enabled) = lookup("MINDGO_AUTO_ADVANCE") {
            match parse_flag(&enabled) {
                Some(flag) => self.auto_advance_enabled = flag,
                None => warn!("Invalid MINDGO_AUTO_ADVANCE value: {}", enabled),
            }
        }

        if let Some(absorb) = lookup("MINDGO_ABSORB_RACING_NEXT") {
            match parse_flag(&absorb) {
                Some(flag) => self.absorb_racing_next = flag,
                None => warn!("Invalid MINDGO_ABSORB_RACING_NEXT value: {}", absorb),
            }
        }

        if let Some(delay) = lookup("MINDGO_AUTO_ADVANCE_DELAY_MS") {
            if let Ok(delay_ms) = delay.parse::<u64>() {
                self.auto_advance_delay_ms = delay_ms;
            } else {
                warn!("Invalid MINDGO_AUTO_ADVANCE_DELAY_MS value: {}", delay);
            }
        }

        if let Some(collection) = lookup("MINDGO_RESULTS_COLLECTION") {
            self.results_collection = collection;
        }

        if let Some(log_level) = lookup("LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.results_collection.trim().is_empty() {
            return Err(CoreError::ConfigurationError(
                "Results collection name is required".to_string(),
            ));
        }

        if self.auto_advance_delay_ms > MAX_AUTO_ADVANCE_DELAY_MS {
            return Err(CoreError::ConfigurationError(format!(
                "Auto-advance delay of {}ms exceeds the maximum of {}ms",
                self.auto_advance_delay_ms, MAX_AUTO_ADVANCE_DELAY_MS
            )));
        }

        Ok(())
    }

    /// Auto-advance delay as a `Duration`
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            auto_advance_enabled: default_auto_advance_enabled(),
            auto_advance_delay_ms: default_auto_advance_delay_ms(),
            absorb_racing_next: default_absorb_racing_next(),
            results_collection: default_results_collection(),
            log_level: default_log_level(),
        }
    }
}
