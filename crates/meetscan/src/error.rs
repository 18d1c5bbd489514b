use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while bringing a meetscan process up.
#[derive(Error, Debug)]
pub enum MeetscanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("No config path given and no home directory to default to")]
    NoConfigPath,

    #[error("No database path configured and no home directory to default to")]
    NoDatabasePath,
}

pub type Result<T> = std::result::Result<T, MeetscanError>;
