//! Core domain logic for StudySmart.
//! This crate is the single source of truth for study-tracking invariants.

pub mod app;
pub mod config;
pub mod db;
pub mod fixtures;
pub mod logging;
pub mod model;
pub mod presentation;
pub mod reactive;
pub mod repo;
pub mod time;
pub mod timer;

pub use app::AppContainer;
pub use config::{ConfigError, CoreConfig};
pub use db::{Database, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::color_list::{decode_color_list, encode_color_list, ColorListParseError};
pub use model::progress::{parse_goal_hours, progress, seconds_to_hours};
pub use model::session::{Session, SessionId, MIN_SESSION_DURATION_SECS};
pub use model::subject::{Subject, SubjectId};
pub use model::task::{partition_tasks, sort_tasks, Priority, Task, TaskId};
pub use model::ModelValidationError;
pub use reactive::{Observable, SnackbarDuration, UiEvent};
pub use repo::session_repo::{SessionRepository, SqliteSessionRepository};
pub use repo::subject_repo::{SqliteSubjectRepository, SubjectRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
