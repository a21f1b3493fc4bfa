//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist tasks and expose per-scope upcoming/completed lists.
//!
//! # Invariants
//! - A task's subject id, when set, references an existing subject at write
//!   time.
//! - List queries load the whole scope and split it with
//!   `partition_tasks`, so both halves share one ordering rule.
//! - Unknown persisted priorities are rejected as invalid data.

use crate::db::Database;
use crate::model::subject::SubjectId;
use crate::model::task::{partition_tasks, Priority, Task, TaskId, TaskPartition};
use crate::reactive::Observable;
use crate::repo::{bool_to_int, ensure_subject_exists, int_to_bool, RepoError, RepoResult};
use log::{error, info};
use rusqlite::{params, Connection, Row};
use std::sync::Arc;

const TASK_SELECT_SQL: &str = "SELECT
        task_id,
        title,
        description,
        due_date,
        priority,
        related_to_subject,
        is_complete,
        task_subject_id
     FROM tasks";

/// Repository interface for task operations.
pub trait TaskRepository: Send + Sync {
    /// Inserts a new task, or replaces the row with the same id.
    fn upsert_task(&self, task: &Task) -> RepoResult<TaskId>;
    /// Deletes one task; `NotFound` when the id is unknown.
    fn delete_task(&self, task_id: TaskId) -> RepoResult<()>;
    /// Live view of a single task.
    fn get_task_by_id(&self, task_id: TaskId) -> Observable<Option<Task>>;
    /// Open tasks of one subject, sorted.
    fn upcoming_tasks_for_subject(&self, subject_id: SubjectId) -> Observable<Vec<Task>>;
    /// Completed tasks of one subject, sorted.
    fn completed_tasks_for_subject(&self, subject_id: SubjectId) -> Observable<Vec<Task>>;
    /// Open tasks across every subject, sorted.
    fn all_upcoming_tasks(&self) -> Observable<Vec<Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository {
    db: Arc<Database>,
}

impl SqliteTaskRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn scope(&self, label: &'static str, subject_id: Option<SubjectId>) -> Observable<TaskPartition> {
        Observable::query(Arc::clone(&self.db), label, move |conn| {
            load_scope(conn, subject_id).map(partition_tasks)
        })
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn upsert_task(&self, task: &Task) -> RepoResult<TaskId> {
        let result = self.db.write(|conn| -> RepoResult<TaskId> {
            if let Some(subject_id) = task.task_subject_id {
                ensure_subject_exists(conn, subject_id)?;
            }
            // a NULL id lets SQLite assign the next rowid
            conn.execute(
                "INSERT INTO tasks (
                    task_id, title, description, due_date, priority,
                    related_to_subject, is_complete, task_subject_id
                 )
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(task_id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    due_date = excluded.due_date,
                    priority = excluded.priority,
                    related_to_subject = excluded.related_to_subject,
                    is_complete = excluded.is_complete,
                    task_subject_id = excluded.task_subject_id;",
                params![
                    task.task_id,
                    task.title,
                    task.description,
                    task.due_date,
                    task.priority.value(),
                    task.related_to_subject,
                    bool_to_int(task.is_complete),
                    task.task_subject_id,
                ],
            )?;
            Ok(task.task_id.unwrap_or_else(|| conn.last_insert_rowid()))
        });

        match &result {
            Ok(task_id) => info!("event=task_upsert module=repo status=ok task_id={task_id}"),
            Err(err) => error!("event=task_upsert module=repo status=error error={err}"),
        }
        result
    }

    fn delete_task(&self, task_id: TaskId) -> RepoResult<()> {
        let result = self.db.write(|conn| -> RepoResult<()> {
            let changed = conn.execute("DELETE FROM tasks WHERE task_id = ?1;", [task_id])?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: "task",
                    id: task_id,
                });
            }
            Ok(())
        });

        match &result {
            Ok(()) => info!("event=task_delete module=repo status=ok task_id={task_id}"),
            Err(err) => {
                error!("event=task_delete module=repo status=error task_id={task_id} error={err}")
            }
        }
        result
    }

    fn get_task_by_id(&self, task_id: TaskId) -> Observable<Option<Task>> {
        Observable::query(Arc::clone(&self.db), "task_by_id", move |conn| {
            let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE task_id = ?1;"))?;
            let mut rows = stmt.query([task_id])?;
            rows.next()?.map(parse_task_row).transpose()
        })
    }

    fn upcoming_tasks_for_subject(&self, subject_id: SubjectId) -> Observable<Vec<Task>> {
        self.scope("subject_upcoming_tasks", Some(subject_id))
            .map(|partition| partition.upcoming)
    }

    fn completed_tasks_for_subject(&self, subject_id: SubjectId) -> Observable<Vec<Task>> {
        self.scope("subject_completed_tasks", Some(subject_id))
            .map(|partition| partition.completed)
    }

    fn all_upcoming_tasks(&self) -> Observable<Vec<Task>> {
        self.scope("all_upcoming_tasks", None)
            .map(|partition| partition.upcoming)
    }
}

/// Loads every task of a scope in id order; `None` means all subjects.
fn load_scope(conn: &Connection, subject_id: Option<SubjectId>) -> RepoResult<Vec<Task>> {
    let mut tasks = Vec::new();
    match subject_id {
        Some(subject_id) => {
            let mut stmt = conn.prepare(&format!(
                "{TASK_SELECT_SQL} WHERE task_subject_id = ?1 ORDER BY task_id ASC;"
            ))?;
            let mut rows = stmt.query([subject_id])?;
            while let Some(row) = rows.next()? {
                tasks.push(parse_task_row(row)?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} ORDER BY task_id ASC;"))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                tasks.push(parse_task_row(row)?);
            }
        }
    }
    Ok(tasks)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let priority_value: i32 = row.get("priority")?;
    let priority = Priority::try_from_value(priority_value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid priority value `{priority_value}` in tasks.priority"))
    })?;

    Ok(Task {
        task_id: Some(row.get("task_id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        priority,
        related_to_subject: row.get("related_to_subject")?,
        is_complete: int_to_bool(row.get("is_complete")?, "tasks.is_complete")?,
        task_subject_id: row.get("task_subject_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{SqliteTaskRepository, TaskRepository};
    use crate::db::Database;
    use crate::model::task::{Priority, Task};
    use crate::repo::RepoError;
    use std::sync::Arc;

    #[test]
    fn task_without_subject_round_trips() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let repo = SqliteTaskRepository::new(db);
        let task = Task {
            description: "chapter 3".to_string(),
            due_date: Some(1_700_000_000_000),
            priority: Priority::High,
            ..Task::new("Read")
        };

        let id = repo.upsert_task(&task).unwrap();
        let stored = repo.get_task_by_id(id).current().unwrap().unwrap();
        assert_eq!(stored, Task { task_id: Some(id), ..task });
    }

    #[test]
    fn unknown_subject_is_rejected() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let repo = SqliteTaskRepository::new(Arc::clone(&db));
        let task = Task {
            task_subject_id: Some(404),
            ..Task::new("Orphan")
        };

        assert!(matches!(
            repo.upsert_task(&task),
            Err(RepoError::SubjectNotFound(404))
        ));
        assert_eq!(db.version(), 0);
    }

    #[test]
    fn delete_reports_missing_task() {
        let repo = SqliteTaskRepository::new(Arc::new(Database::open_in_memory().unwrap()));
        let id = repo.upsert_task(&Task::new("Once")).unwrap();
        repo.delete_task(id).unwrap();
        assert!(matches!(
            repo.delete_task(id),
            Err(RepoError::NotFound { entity: "task", .. })
        ));
    }
}
