pub mod loader;
pub mod schema;

pub use loader::{default_config_path, load_config, load_config_from_str, CONFIG_ENV_VAR};
pub use schema::{
    Config, DatabaseConfig, ImapAuthSettings, ImapAuthType, ImapConfig, IngestConfig, LogFormat,
    LoggingConfig, ServerConfig,
};
