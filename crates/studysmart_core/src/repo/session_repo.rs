//! Session repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Sessions are append-only: there is no update path.
//! - Listing order is `date DESC, session_id DESC`.
//! - Duration sums are `0` for an empty scope.

use crate::db::Database;
use crate::model::session::{Session, SessionId};
use crate::model::subject::SubjectId;
use crate::reactive::Observable;
use crate::repo::{ensure_subject_exists, RepoError, RepoResult};
use log::{error, info};
use rusqlite::{params, Connection, Params, Row};
use std::sync::Arc;

const SESSION_SELECT_SQL: &str =
    "SELECT session_id, session_subject_id, related_to_subject, date, duration FROM sessions";
const SESSION_ORDER_SQL: &str = "ORDER BY date DESC, session_id DESC";

/// Repository interface for session operations.
pub trait SessionRepository: Send + Sync {
    /// Records a finished session and returns its id.
    fn insert_session(&self, session: &Session) -> RepoResult<SessionId>;
    /// Deletes one session; `NotFound` when the id is unknown.
    fn delete_session(&self, session_id: SessionId) -> RepoResult<()>;
    /// Every session, newest first.
    fn all_sessions(&self) -> Observable<Vec<Session>>;
    /// Five newest sessions across all subjects.
    fn recent_five_sessions(&self) -> Observable<Vec<Session>>;
    /// Ten newest sessions of one subject.
    fn recent_ten_sessions_for_subject(&self, subject_id: SubjectId) -> Observable<Vec<Session>>;
    /// Total studied seconds.
    fn total_sessions_duration(&self) -> Observable<i64>;
    /// Total studied seconds for one subject.
    fn total_sessions_duration_by_subject(&self, subject_id: SubjectId) -> Observable<i64>;
}

/// SQLite-backed session repository.
pub struct SqliteSessionRepository {
    db: Arc<Database>,
}

impl SqliteSessionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl SessionRepository for SqliteSessionRepository {
    fn insert_session(&self, session: &Session) -> RepoResult<SessionId> {
        session.validate()?;

        let result = self.db.write(|conn| -> RepoResult<SessionId> {
            ensure_subject_exists(conn, session.session_subject_id)?;
            conn.execute(
                "INSERT INTO sessions (session_subject_id, related_to_subject, date, duration)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    session.session_subject_id,
                    session.related_to_subject,
                    session.date,
                    session.duration,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        });

        match &result {
            Ok(session_id) => info!(
                "event=session_insert module=repo status=ok session_id={session_id} duration={}",
                session.duration
            ),
            Err(err) => error!("event=session_insert module=repo status=error error={err}"),
        }
        result
    }

    fn delete_session(&self, session_id: SessionId) -> RepoResult<()> {
        let result = self.db.write(|conn| -> RepoResult<()> {
            let changed =
                conn.execute("DELETE FROM sessions WHERE session_id = ?1;", [session_id])?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: "session",
                    id: session_id,
                });
            }
            Ok(())
        });

        match &result {
            Ok(()) => info!("event=session_delete module=repo status=ok session_id={session_id}"),
            Err(err) => error!(
                "event=session_delete module=repo status=error session_id={session_id} error={err}"
            ),
        }
        result
    }

    fn all_sessions(&self) -> Observable<Vec<Session>> {
        Observable::query(Arc::clone(&self.db), "all_sessions", |conn| {
            list_sessions(conn, &format!("{SESSION_SELECT_SQL} {SESSION_ORDER_SQL};"), [])
        })
    }

    fn recent_five_sessions(&self) -> Observable<Vec<Session>> {
        Observable::query(Arc::clone(&self.db), "recent_sessions", |conn| {
            list_sessions(
                conn,
                &format!("{SESSION_SELECT_SQL} {SESSION_ORDER_SQL} LIMIT 5;"),
                [],
            )
        })
    }

    fn recent_ten_sessions_for_subject(&self, subject_id: SubjectId) -> Observable<Vec<Session>> {
        Observable::query(
            Arc::clone(&self.db),
            "subject_recent_sessions",
            move |conn| {
                list_sessions(
                    conn,
                    &format!(
                        "{SESSION_SELECT_SQL} WHERE session_subject_id = ?1 {SESSION_ORDER_SQL} LIMIT 10;"
                    ),
                    [subject_id],
                )
            },
        )
    }

    fn total_sessions_duration(&self) -> Observable<i64> {
        Observable::query(Arc::clone(&self.db), "sessions_duration", |conn| {
            Ok(conn.query_row(
                "SELECT COALESCE(SUM(duration), 0) FROM sessions;",
                [],
                |row| row.get(0),
            )?)
        })
    }

    fn total_sessions_duration_by_subject(&self, subject_id: SubjectId) -> Observable<i64> {
        Observable::query(
            Arc::clone(&self.db),
            "subject_sessions_duration",
            move |conn| {
                Ok(conn.query_row(
                    "SELECT COALESCE(SUM(duration), 0) FROM sessions WHERE session_subject_id = ?1;",
                    [subject_id],
                    |row| row.get(0),
                )?)
            },
        )
    }
}

fn list_sessions(conn: &Connection, sql: &str, params: impl Params) -> RepoResult<Vec<Session>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut sessions = Vec::new();
    while let Some(row) = rows.next()? {
        sessions.push(parse_session_row(row)?);
    }
    Ok(sessions)
}

fn parse_session_row(row: &Row<'_>) -> RepoResult<Session> {
    let session = Session {
        session_id: Some(row.get("session_id")?),
        session_subject_id: row.get("session_subject_id")?,
        related_to_subject: row.get("related_to_subject")?,
        date: row.get("date")?,
        duration: row.get("duration")?,
    };
    session.validate()?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::{SessionRepository, SqliteSessionRepository};
    use crate::db::Database;
    use crate::model::session::Session;
    use crate::repo::RepoError;
    use std::sync::Arc;

    #[test]
    fn insert_requires_existing_subject() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let repo = SqliteSessionRepository::new(Arc::clone(&db));

        let err = repo
            .insert_session(&Session::new(7, "Ghost", 1_000, 60))
            .unwrap_err();
        assert!(matches!(err, RepoError::SubjectNotFound(7)));
        assert_eq!(repo.total_sessions_duration().current().unwrap(), 0);
    }

    #[test]
    fn negative_duration_is_a_validation_error() {
        let repo = SqliteSessionRepository::new(Arc::new(Database::open_in_memory().unwrap()));
        assert!(matches!(
            repo.insert_session(&Session::new(1, "Math", 1_000, -5)),
            Err(RepoError::Validation(_))
        ));
    }
}
