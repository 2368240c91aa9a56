//! SQLite persistence shared by every repository in the crate.
//!
//! The academic tables live in the main database; credentials live in a second file
//! attached under the `auth_db` schema name so queries can address them as
//! `auth_db.users_auth`.

mod migrations;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;

use crate::config::DatabaseConfig;

pub use migrations::SCHEMA_VERSION;

/// Name under which the credential store is attached.
pub const AUTH_SCHEMA: &str = "auth_db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database connection lock poisoned")]
    Poisoned,
    #[error("malformed row: {0}")]
    Malformed(String),
}

/// Owns the single SQLite connection. Every operation takes the lock for its duration,
/// so callers on async runtimes should reach it through `spawn_blocking`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open both databases described by `config` and bring the schema up to date.
    pub fn open(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let conn = if is_memory(&config.erp_path) {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.erp_path)?
        };
        let auth_target = if is_memory(&config.auth_path) {
            ":memory:".to_string()
        } else {
            config.auth_path.to_string_lossy().into_owned()
        };
        Self::initialize(conn, &auth_target)
    }

    /// Fresh in-memory databases, used by tests and demos.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::open(&DatabaseConfig::in_memory())
    }

    fn initialize(conn: Connection, auth_target: &str) -> Result<Self, StorageError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute(
            &format!("ATTACH DATABASE ?1 AS {AUTH_SCHEMA}"),
            [auth_target],
        )?;
        migrations::run(&conn)?;
        tracing::debug!(auth = auth_target, "database ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E>,
        E: From<StorageError>,
    {
        let mut guard = self.lock()?;
        f(&mut *guard)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

fn is_memory(path: &Path) -> bool {
    path.as_os_str() == ":memory:"
}

/// True for UNIQUE, CHECK, and FOREIGN KEY failures.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
