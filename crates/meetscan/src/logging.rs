//! Process-wide logging setup.
//!
//! Library code logs through both `log` (I/O-level modules) and `tracing`
//! (pipeline spans). [`init`] installs a single `tracing` subscriber and
//! forwards `log` records into it.

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::MeetscanError;

/// Builds the filter: `RUST_LOG` when set and valid, else the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), MeetscanError> {
    tracing_log::LogTracer::init().map_err(|e| MeetscanError::Logging(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter(config));
    let result = match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Pretty => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
    result.map_err(|e| MeetscanError::Logging(e.to_string()))?;

    tracing::info!(format = ?config.format, level = %config.level, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_filter_falls_back_to_config_level() {
        let original = std::env::var_os("RUST_LOG");
        std::env::remove_var("RUST_LOG");

        let config = LoggingConfig {
            level: "meetscan=debug".to_string(),
            format: LogFormat::Json,
        };
        assert_eq!(env_filter(&config).to_string(), "meetscan=debug");

        if let Some(value) = original {
            std::env::set_var("RUST_LOG", value);
        }
    }
}
