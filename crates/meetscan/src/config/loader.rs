use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::config::schema::{Config, ImapAuthType, MAX_LOOKBACK_HOURS};
use crate::error::ConfigError;
use crate::secrets::has_secret_source;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "MEETSCAN_CONFIG";

/// Returns `$MEETSCAN_CONFIG`, or `~/.meetscan/config.json`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    dirs::home_dir()
        .map(|h| h.join(".meetscan").join("config.json"))
        .ok_or(ConfigError::NoConfigPath)
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    let imap = &config.imap;
    if imap.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "imap.host must not be empty".to_string(),
        });
    }
    if imap.port == 0 {
        return Err(ConfigError::Validation {
            message: "imap.port must be non-zero".to_string(),
        });
    }
    if imap.connect_timeout_secs == 0 || imap.read_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "imap timeouts must be at least one second".to_string(),
        });
    }

    let auth = &imap.auth;
    let has_source = match auth.auth_type {
        ImapAuthType::Password => has_secret_source(
            auth.password_insecure.as_deref(),
            auth.password_file.as_deref(),
            auth.password_env_var.as_deref(),
        ),
        ImapAuthType::OAuth2 => has_secret_source(
            auth.access_token_insecure.as_deref(),
            auth.access_token_file.as_deref(),
            auth.access_token_env_var.as_deref(),
        ),
    };
    if !has_source {
        return Err(ConfigError::Validation {
            message: format!(
                "imap.auth has no secret source for auth type {:?}",
                auth.auth_type
            ),
        });
    }

    if !(1..=MAX_LOOKBACK_HOURS).contains(&config.ingest.lookback_hours) {
        return Err(ConfigError::Validation {
            message: format!(
                "ingest.lookbackHours must be between 1 and {}, got {}",
                MAX_LOOKBACK_HOURS, config.ingest.lookback_hours
            ),
        });
    }

    if config.server.bind.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation {
            message: format!("server.bind is not a socket address: {}", config.server.bind),
        });
    }

    Ok(())
}
