//! Subject repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist subjects with their goal and card colors.
//! - Expose subject aggregates (count, total goal hours) as live queries.
//! - Own the cascade that removes a subject's tasks and sessions.
//!
//! # Invariants
//! - `upsert_subject` validates before SQL mutation.
//! - `delete_subject` removes tasks, then sessions, then the subject, in a
//!   single transaction; a missing subject rolls back with `NotFound`.
//! - Read paths decode colors strictly and re-validate goal hours.

use crate::db::Database;
use crate::model::color_list::{decode_color_list, encode_color_list};
use crate::model::subject::{Subject, SubjectId};
use crate::reactive::Observable;
use crate::repo::{RepoError, RepoResult};
use log::{error, info};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::sync::Arc;

const SUBJECT_SELECT_SQL: &str = "SELECT subject_id, name, goal_hours, colors FROM subjects";

/// Repository interface for subject operations.
pub trait SubjectRepository: Send + Sync {
    /// Inserts a new subject, or replaces the row with the same id.
    /// Returns the persisted id.
    fn upsert_subject(&self, subject: &Subject) -> RepoResult<SubjectId>;
    /// Number of stored subjects.
    fn total_subject_count(&self) -> Observable<i64>;
    /// Sum of all goal hours; `0.0` when there are no subjects.
    fn total_goal_hours(&self) -> Observable<f32>;
    /// Deletes the subject together with its tasks and sessions.
    fn delete_subject(&self, subject_id: SubjectId) -> RepoResult<()>;
    /// Live view of a single subject; `None` once it is gone.
    fn get_subject_by_id(&self, subject_id: SubjectId) -> Observable<Option<Subject>>;
    /// All subjects, ordered by id.
    fn all_subjects(&self) -> Observable<Vec<Subject>>;
}

/// SQLite-backed subject repository.
pub struct SqliteSubjectRepository {
    db: Arc<Database>,
}

impl SqliteSubjectRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl SubjectRepository for SqliteSubjectRepository {
    fn upsert_subject(&self, subject: &Subject) -> RepoResult<SubjectId> {
        subject.validate()?;
        let colors = encode_color_list(&subject.colors);

        let result = self.db.write(|conn| -> RepoResult<SubjectId> {
            match subject.subject_id {
                Some(subject_id) => {
                    conn.execute(
                        "INSERT INTO subjects (subject_id, name, goal_hours, colors)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(subject_id) DO UPDATE SET
                            name = excluded.name,
                            goal_hours = excluded.goal_hours,
                            colors = excluded.colors;",
                        params![subject_id, subject.name, f64::from(subject.goal_hours), colors],
                    )?;
                    Ok(subject_id)
                }
                None => {
                    conn.execute(
                        "INSERT INTO subjects (name, goal_hours, colors) VALUES (?1, ?2, ?3);",
                        params![subject.name, f64::from(subject.goal_hours), colors],
                    )?;
                    Ok(conn.last_insert_rowid())
                }
            }
        });

        match &result {
            Ok(subject_id) => {
                info!("event=subject_upsert module=repo status=ok subject_id={subject_id}")
            }
            Err(err) => error!("event=subject_upsert module=repo status=error error={err}"),
        }
        result
    }

    fn total_subject_count(&self) -> Observable<i64> {
        Observable::query(Arc::clone(&self.db), "subject_count", |conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM subjects;", [], |row| row.get(0))?)
        })
    }

    fn total_goal_hours(&self) -> Observable<f32> {
        Observable::query(Arc::clone(&self.db), "subject_goal_hours", |conn| {
            let total: f64 = conn.query_row(
                "SELECT COALESCE(SUM(goal_hours), 0.0) FROM subjects;",
                [],
                |row| row.get(0),
            )?;
            Ok(total as f32)
        })
    }

    fn delete_subject(&self, subject_id: SubjectId) -> RepoResult<()> {
        let result = self.db.write(|conn| -> RepoResult<()> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let tasks = tx.execute("DELETE FROM tasks WHERE task_subject_id = ?1;", [subject_id])?;
            let sessions = tx.execute(
                "DELETE FROM sessions WHERE session_subject_id = ?1;",
                [subject_id],
            )?;
            let subjects = tx.execute("DELETE FROM subjects WHERE subject_id = ?1;", [subject_id])?;
            if subjects == 0 {
                // dropping `tx` rolls back
                return Err(RepoError::NotFound {
                    entity: "subject",
                    id: subject_id,
                });
            }
            tx.commit()?;
            info!(
                "event=subject_delete module=repo status=ok subject_id={subject_id} tasks={tasks} sessions={sessions}"
            );
            Ok(())
        });

        if let Err(err) = &result {
            error!(
                "event=subject_delete module=repo status=error subject_id={subject_id} error={err}"
            );
        }
        result
    }

    fn get_subject_by_id(&self, subject_id: SubjectId) -> Observable<Option<Subject>> {
        Observable::query(Arc::clone(&self.db), "subject_by_id", move |conn| {
            load_subject(conn, subject_id)
        })
    }

    fn all_subjects(&self) -> Observable<Vec<Subject>> {
        Observable::query(Arc::clone(&self.db), "all_subjects", |conn| {
            let mut stmt = conn.prepare(&format!("{SUBJECT_SELECT_SQL} ORDER BY subject_id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut subjects = Vec::new();
            while let Some(row) = rows.next()? {
                subjects.push(parse_subject_row(row)?);
            }
            Ok(subjects)
        })
    }
}

fn load_subject(conn: &Connection, subject_id: SubjectId) -> RepoResult<Option<Subject>> {
    let mut stmt = conn.prepare(&format!("{SUBJECT_SELECT_SQL} WHERE subject_id = ?1;"))?;
    let mut rows = stmt.query([subject_id])?;
    rows.next()?.map(parse_subject_row).transpose()
}

fn parse_subject_row(row: &Row<'_>) -> RepoResult<Subject> {
    build_subject(
        row.get("subject_id")?,
        row.get("name")?,
        row.get("goal_hours")?,
        &row.get::<_, String>("colors")?,
    )
}

fn build_subject(
    subject_id: SubjectId,
    name: String,
    goal_hours: f64,
    colors: &str,
) -> RepoResult<Subject> {
    let subject = Subject {
        subject_id: Some(subject_id),
        name,
        goal_hours: goal_hours as f32,
        colors: decode_color_list(colors)?,
    };
    subject.validate()?;
    Ok(subject)
}

#[cfg(test)]
mod tests {
    use super::{SqliteSubjectRepository, SubjectRepository};
    use crate::db::{Database, DbError};
    use crate::model::subject::Subject;
    use crate::repo::RepoError;
    use std::sync::Arc;

    fn repo() -> (Arc<Database>, SqliteSubjectRepository) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        (Arc::clone(&db), SqliteSubjectRepository::new(db))
    }

    #[test]
    fn upsert_without_id_inserts_and_with_id_replaces() {
        let (_, repo) = repo();
        let id = repo
            .upsert_subject(&Subject::new("Physics", 10.0, vec![16711680, 65280]))
            .unwrap();

        let stored = repo.get_subject_by_id(id).current().unwrap().unwrap();
        assert_eq!(stored.name, "Physics");
        assert_eq!(stored.colors, vec![16711680, 65280]);

        let renamed = Subject::new("Physics II", 12.5, Vec::new()).with_id(id);
        assert_eq!(repo.upsert_subject(&renamed).unwrap(), id);
        assert_eq!(repo.total_subject_count().current().unwrap(), 1);
        assert_eq!(
            repo.get_subject_by_id(id).current().unwrap(),
            Some(renamed)
        );
    }

    #[test]
    fn upsert_rejects_negative_goal_without_writing() {
        let (db, repo) = repo();
        let err = repo
            .upsert_subject(&Subject::new("Bad", -2.0, Vec::new()))
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert_eq!(db.version(), 0);
    }

    #[test]
    fn aggregates_default_to_zero() {
        let (_, repo) = repo();
        assert_eq!(repo.total_subject_count().current().unwrap(), 0);
        assert_eq!(repo.total_goal_hours().current().unwrap(), 0.0);

        repo.upsert_subject(&Subject::new("A", 1.5, Vec::new())).unwrap();
        repo.upsert_subject(&Subject::new("B", 2.5, Vec::new())).unwrap();
        assert_eq!(repo.total_goal_hours().current().unwrap(), 4.0);
    }

    #[test]
    fn deleting_missing_subject_is_not_found() {
        let (_, repo) = repo();
        assert!(matches!(
            repo.delete_subject(99),
            Err(RepoError::NotFound {
                entity: "subject",
                id: 99
            })
        ));
    }

    #[test]
    fn corrupt_colors_surface_as_invalid_data() {
        let (db, repo) = repo();
        db.write(|conn| {
            conn.execute(
                "INSERT INTO subjects (name, goal_hours, colors) VALUES ('Art', 1.0, 'red,12');",
                [],
            )
            .map_err(DbError::from)
        })
        .unwrap();

        assert!(matches!(
            repo.all_subjects().current(),
            Err(RepoError::InvalidData(_))
        ));
    }
}
