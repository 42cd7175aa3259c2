//! Blob repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable get/put/delete APIs over namespaced JSON blobs.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Construction rejects connections without applied migrations.
//! - `put` is an upsert; keys are unique.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for blob persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection has not been migrated to the expected schema version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Migrated connection is missing a required table.
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; run migrations first"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value blob access contract.
///
/// Values are opaque to this layer; callers own the JSON codec.
pub trait BlobRepository: Send + Sync {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> RepoResult<()>;
    fn delete(&self, key: &str) -> RepoResult<()>;
}

/// SQLite-backed blob repository.
///
/// Owns its connection: the repository is a long-lived handle shared by the
/// goal store, settings state and identity mock. The mutex only satisfies
/// aliasing rules for the callback-driven single-thread execution model; a
/// poisoned lock is recovered, not propagated.
pub struct SqliteBlobRepository {
    conn: Mutex<Connection>,
}

impl SqliteBlobRepository {
    /// Wraps a migrated connection, verifying schema readiness.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `PRAGMA user_version` does not match
    ///   the latest migration.
    /// - `MissingRequiredTable` when the `blobs` table is absent.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        let expected = latest_version();
        let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual != expected {
            return Err(RepoError::UninitializedConnection {
                expected_version: expected,
                actual_version: actual,
            });
        }

        let table_count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'blobs';",
            [],
            |row| row.get(0),
        )?;
        if table_count == 0 {
            return Err(RepoError::MissingRequiredTable("blobs"));
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlobRepository for SqliteBlobRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM blobs WHERE key = ?1;")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(row.get(0)?));
        }
        Ok(None)
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn().execute(
            "INSERT INTO blobs (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> RepoResult<()> {
        self.conn()
            .execute("DELETE FROM blobs WHERE key = ?1;", params![key])?;
        Ok(())
    }
}
