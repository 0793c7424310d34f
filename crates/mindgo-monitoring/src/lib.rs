//! Logging setup for the MindGo flow runtime.

use mindgo_core::FlowConfig;
use std::env;

pub mod logging;
pub use logging::{init_logging, init_test_tracing};

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// Log level filter (e.g., "info,mindgo_core=debug")
    pub log_filter: String,
    /// Emit JSON lines instead of pretty output
    pub json: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "mindgo".to_string(),
            log_filter: "info".to_string(),
            json: false,
        }
    }
}

impl MonitoringConfig {
    /// Read `MINDGO_SERVICE_NAME`, `LOG_LEVEL` and `MINDGO_LOG_FORMAT`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(name) = lookup("MINDGO_SERVICE_NAME") {
            config.service_name = name;
        }
        if let Some(filter) = lookup("LOG_LEVEL") {
            config.log_filter = filter;
        }
        if let Some(format) = lookup("MINDGO_LOG_FORMAT") {
            config.json = format.eq_ignore_ascii_case("json");
        }
        config
    }

    /// Take the log filter from a flow configuration
    pub fn from_flow_config(flow: &FlowConfig) -> Self {
        Self {
            log_filter: flow.log_level.clone(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_defaults() {
        let config = MonitoringConfig::default();
        assert_eq!(config.service_name, "mindgo");
        assert_eq!(config.log_filter, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = MonitoringConfig::from_lookup(|key| match key {
            "MINDGO_SERVICE_NAME" => Some("mindgo-patient".to_string()),
            "LOG_LEVEL" => Some("debug".to_string()),
            "MINDGO_LOG_FORMAT" => Some("JSON".to_string()),
            _ => None,
        });
        assert_eq!(
            config,
            MonitoringConfig {
                service_name: "mindgo-patient".to_string(),
                log_filter: "debug".to_string(),
                json: true,
            }
        );
    }

    #[test]
    fn test_config_from_flow_config() {
        let flow = FlowConfig {
            log_level: "warn".to_string(),
            ..FlowConfig::default()
        };
        let config = MonitoringConfig::from_flow_config(&flow);
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.service_name, "mindgo");
    }
}
