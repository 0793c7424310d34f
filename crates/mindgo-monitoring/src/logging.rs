//! Structured logging module using tracing.
//!
//! Installs a global subscriber with an env filter and either pretty output
//! for development or JSON lines for log aggregation.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::MonitoringConfig;

/// Build the filter; `RUST_LOG` takes precedence over the configured filter
pub fn build_filter(config: &MonitoringConfig, rust_log: Option<&str>) -> anyhow::Result<EnvFilter> {
    let directives = rust_log.unwrap_or(&config.log_filter);
    EnvFilter::try_new(directives).with_context(|| format!("Invalid log filter: {}", directives))
}

/// Initialize structured logging
pub fn init_logging(config: &MonitoringConfig) -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = build_filter(config, rust_log.as_deref())?;

    let json_layer = config.json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });
    let pretty_layer = (!config.json).then(|| {
        fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .context("Failed to set global default subscriber")?;

    info!(
        service_name = %config.service_name,
        log_format = if config.json { "json" } else { "pretty" },
        "Logging initialized"
    );

    Ok(())
}

/// Install a test-writer subscriber; later calls are ignored
pub fn init_test_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_target(false)
        .with_test_writer()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_overrides_config() {
        let config = MonitoringConfig::default();
        let filter = build_filter(&config, Some("mindgo_core=trace")).unwrap();
        assert_eq!(filter.to_string(), "mindgo_core=trace");

        let filter = build_filter(&config, None).unwrap();
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = MonitoringConfig {
            log_filter: "mindgo_core=loud".to_string(),
            ..MonitoringConfig::default()
        };
        assert!(build_filter(&config, None).is_err());
    }

    #[test]
    fn test_test_tracing_can_be_installed_twice() {
        init_test_tracing();
        init_test_tracing();
        tracing::debug!("test tracing installed");
    }
}
