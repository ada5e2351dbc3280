//! Storage layer for the clockwork time tracker.
//!
//! Provides SQLite persistence for projects, categories and time entries
//! using `rusqlite`. [`Database`] implements every repository trait from
//! `cw-core`.
//!
//! # Thread Safety
//!
//! The connection sits behind a `Mutex`, so a `Database` is `Send + Sync`
//! and can be shared through an `Arc`. Separate `Database` instances opened
//! on the same file coordinate through SQLite's own locking.
//!
//! # Active Entry Slot
//!
//! [`TimeEntryRepository::with_active_slot`] holds the connection lock and
//! runs its closure inside a `BEGIN IMMEDIATE` transaction. The mutex
//! serializes callers in this process; the reserved lock taken by
//! `IMMEDIATE` serializes other processes. A partial unique index on
//! running entries backs this up at the schema level.
//!
//! # Timestamp Format
//!
//! Timestamps are stored as TEXT in ISO 8601 format with a fixed nine-digit
//! fraction (e.g., `2025-11-02T10:00:00.000000000Z`), so values round-trip
//! exactly, lexicographic ordering matches chronological ordering and range
//! filters can compare text.
//!
//! [`TimeEntryRepository::with_active_slot`]: cw_core::TimeEntryRepository::with_active_slot

mod categories;
mod entries;
mod migrations;
mod projects;

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use cw_core::{Deadline, ParseIdError, RepoError, RepoResult};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, Row, ffi};
use thiserror::Error;
use tracing::debug;

pub use migrations::latest_version;

/// Upper bound for waiting on a locked database file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The file was written by a newer version of this program.
    #[error("database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp in column {column}: {value}")]
    TimestampParse {
        column: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A thread panicked while holding the connection.
    #[error("database connection lock poisoned")]
    LockPoisoned,
}

impl From<DbError> for RepoError {
    fn from(err: DbError) -> Self {
        if let DbError::Sqlite(sqlite) = &err {
            match sqlite {
                rusqlite::Error::QueryReturnedNoRows => return Self::NotFound,
                rusqlite::Error::SqliteFailure(failure, _)
                    if failure.code == ErrorCode::ConstraintViolation =>
                {
                    match failure.extended_code {
                        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                            return Self::Duplicate;
                        }
                        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Self::ForeignKeyViolation,
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        Self::storage(err)
    }
}

/// Converts a `rusqlite` failure into the repository vocabulary.
fn repo_err(err: rusqlite::Error) -> RepoError {
    DbError::Sqlite(err).into()
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// Pending schema migrations are applied on open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        debug!(path = %path.display(), "opening database");
        let mut conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::init(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let mut conn = Connection::open_in_memory()?;
        Self::init(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init(conn: &mut Connection) -> Result<(), DbError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrations::apply(conn)
    }

    /// Round-trips a trivial query.
    pub fn ping(&self) -> Result<(), DbError> {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// The schema version recorded in the database file.
    pub fn schema_version(&self) -> Result<u32, DbError> {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        migrations::current_version(&conn)
    }

    /// Locks the connection for one repository call.
    ///
    /// Fails if the deadline has passed, either before or after waiting for
    /// the lock, and caps SQLite's busy wait at the remaining time.
    fn lock(&self, deadline: &Deadline) -> RepoResult<MutexGuard<'_, Connection>> {
        deadline.check()?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| RepoError::from(DbError::LockPoisoned))?;
        deadline.check()?;
        let wait = deadline
            .remaining()
            .map_or(BUSY_TIMEOUT, |left| left.min(BUSY_TIMEOUT));
        conn.busy_timeout(wait).map_err(repo_err)?;
        Ok(conn)
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

fn conversion_failure(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn column_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| {
            conversion_failure(
                idx,
                DbError::TimestampParse {
                    column: idx,
                    value,
                    source,
                },
            )
        })
}

fn column_opt_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get_ref(idx)? {
        rusqlite::types::ValueRef::Null => Ok(None),
        _ => column_timestamp(row, idx).map(Some),
    }
}

fn column_id<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseIdError>,
{
    let value: String = row.get(idx)?;
    value.parse().map_err(|err| conversion_failure(idx, err))
}

fn column_opt_id<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = ParseIdError>,
{
    let value: Option<String> = row.get(idx)?;
    value
        .map(|value| value.parse().map_err(|err| conversion_failure(idx, err)))
        .transpose()
}
