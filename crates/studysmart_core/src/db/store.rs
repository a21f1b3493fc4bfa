//! Shared store handle.
//!
//! # Responsibility
//! - Own the single SQLite connection behind a mutex.
//! - Publish a monotonically increasing invalidation counter after every
//!   successful write, so live queries know when to re-run.
//!
//! # Invariants
//! - The counter only moves after the write closure returned `Ok`.
//! - Readers and writers never hold the lock across an `.await`.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

/// Serialized connection plus write-invalidation signal.
pub struct Database {
    conn: Mutex<Connection>,
    invalidation: watch::Sender<u64>,
}

impl Database {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        let (invalidation, _) = watch::channel(0);
        Self {
            conn: Mutex::new(conn),
            invalidation,
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens (and migrates) a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Runs a read-only closure against the connection.
    pub fn read<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Runs a mutating closure and bumps the invalidation counter on success.
    pub fn write<T, E>(&self, f: impl FnOnce(&mut Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let mut conn = self.lock()?;
        let value = f(&mut conn)?;
        drop(conn);
        self.invalidation
            .send_modify(|version| *version = version.wrapping_add(1));
        Ok(value)
    }

    /// Subscribes to write invalidations.
    pub fn invalidations(&self) -> watch::Receiver<u64> {
        self.invalidation.subscribe()
    }

    /// Current invalidation counter value.
    pub fn version(&self) -> u64 {
        *self.invalidation.borrow()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::db::DbError;

    #[test]
    fn successful_write_bumps_version() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.version(), 0);

        db.write(|conn| {
            conn.execute(
                "INSERT INTO subjects (name, goal_hours, colors) VALUES ('Math', 2.0, '');",
                [],
            )
            .map_err(DbError::from)
        })
        .unwrap();

        assert_eq!(db.version(), 1);
    }

    #[test]
    fn failed_write_keeps_version() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<(), DbError> = db.write(|conn| {
            conn.execute("INSERT INTO missing_table VALUES (1);", [])?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(db.version(), 0);
    }

    #[test]
    fn read_sees_committed_rows() {
        let db = Database::open_in_memory().unwrap();
        db.write(|conn| {
            conn.execute(
                "INSERT INTO subjects (name, goal_hours, colors) VALUES ('Art', 1.0, '');",
                [],
            )
            .map_err(DbError::from)
        })
        .unwrap();

        let count: i64 = db
            .read(|conn| {
                conn.query_row("SELECT COUNT(*) FROM subjects;", [], |row| row.get(0))
                    .map_err(DbError::from)
            })
            .unwrap();
        assert_eq!(count, 1);
    }
}
