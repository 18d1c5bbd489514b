pub mod classifier;
pub mod config;
pub mod cursor;
pub mod db;
pub mod email;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod pipeline;
pub mod secrets;

pub use config::{load_config, Config};
pub use db::{Database, DatabaseError, EmailRecord, StoredEmail};
pub use email::{EmailError, ImapClient, MailSource};
pub use error::{ConfigError, MeetscanError, Result};
pub use extractor::{DateTimeExtractor, DateTimeRecognizer, EnglishRecognizer};
pub use pipeline::{CycleReport, CycleSummary, IngestPipeline, MessageOutcome, PipelineError, SkipReason};
pub use secrets::{resolve_secret, SecretError};
