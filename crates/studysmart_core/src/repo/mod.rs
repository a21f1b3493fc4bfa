//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for subjects, tasks and
//!   sessions.
//! - Expose reads as `Observable` live queries and writes as blocking calls.
//! - Isolate SQL details from controllers.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - A referenced subject must exist at write time.
//! - Subject deletion removes dependent tasks and sessions in the same
//!   transaction.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::color_list::ColorListParseError;
use crate::model::subject::SubjectId;
use crate::model::ModelValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod session_repo;
pub mod subject_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    /// Target row does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// A written record references a subject that does not exist.
    SubjectNotFound(SubjectId),
    InvalidData(String),
    /// The store lock was poisoned by a panicking writer.
    StoreUnavailable,
    /// A background write worker failed before returning a result.
    Worker(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::SubjectNotFound(id) => write!(f, "referenced subject does not exist: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::StoreUnavailable => write!(f, "store is unavailable"),
            Self::Worker(message) => write!(f, "background write failed: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Poisoned => Self::StoreUnavailable,
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ColorListParseError> for RepoError {
    fn from(value: ColorListParseError) -> Self {
        Self::InvalidData(format!("subjects.colors: {value}"))
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn ensure_subject_exists(conn: &rusqlite::Connection, subject_id: SubjectId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM subjects WHERE subject_id = ?1);",
        [subject_id],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::SubjectNotFound(subject_id))
    }
}
