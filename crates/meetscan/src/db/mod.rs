//! The message store.
//!
//! One SQLite file holds every ingested message in the `emails` table. The
//! ingestion cursor is derived from it (see [`crate::cursor`]), so there is
//! no other persistent state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::DatabaseConfig;
use crate::error::{ConfigError, Result as StartupResult};

pub mod email_repo;
pub mod error;
pub mod migrations;

pub use email_repo::{EmailRecord, StoredEmail};
pub use error::DatabaseError;

/// Shared handle to the store.
///
/// Clones share one connection. Statements from the pipeline and the HTTP
/// handlers run one at a time behind the mutex.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the store named by `database.path`, or the default location.
    pub fn from_config(config: &DatabaseConfig) -> StartupResult<Self> {
        let path = config
            .resolved_path()
            .ok_or(ConfigError::NoDatabasePath)?;
        Ok(Self::open(&path)?)
    }

    /// Opens (or creates) the store file, creating parent directories and
    /// applying pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        migrations::run_all(&conn)?;

        log::info!("Message store opened at {}", path.display());
        Ok(Self::wrap(conn))
    }

    /// Empty, fully migrated store that lives as long as the handle.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        migrations::run_all(&conn)?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// `~/.meetscan/data/meetscan.db`, or `None` without a home directory.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".meetscan").join("data").join("meetscan.db"))
}
