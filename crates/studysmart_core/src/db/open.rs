//! Connection bootstrap.
//!
//! Every connection handed out here has a busy timeout set and the schema
//! migrated to [`latest_version`](super::migrations::latest_version).
//! Foreign keys stay off; subject cascades are done by the repositories.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy)]
enum Target {
    File,
    Memory,
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Memory => "memory",
        })
    }
}

/// Opens (creating if needed) the store file at `path`.
///
/// Logs `event=db_open` with the elapsed time on both outcomes.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    bootstrap(Target::File, || Connection::open(path))
}

/// Private store that lives as long as the returned connection.
pub fn open_db_in_memory() -> DbResult<Connection> {
    bootstrap(Target::Memory, Connection::open_in_memory)
}

fn bootstrap(
    target: Target,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={target}");

    let opened = connect()
        .map_err(|err| ("db_open_failed", DbError::from(err)))
        .and_then(|mut conn| match prepare(&mut conn) {
            Ok(()) => Ok(conn),
            Err(err) => Err(("db_bootstrap_failed", err)),
        });
    let elapsed_ms = started_at.elapsed().as_millis();

    match opened {
        Ok(conn) => {
            info!("event=db_open module=db status=ok mode={target} duration_ms={elapsed_ms}");
            Ok(conn)
        }
        Err((code, err)) => {
            error!(
                "event=db_open module=db status=error mode={target} duration_ms={elapsed_ms} error_code={code} error={err}"
            );
            Err(err)
        }
    }
}

fn prepare(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}
