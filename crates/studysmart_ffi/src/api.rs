//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose subject, task and session use cases to Dart via FRB.
//! - Flatten core errors into response envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens the store at one process-wide path.

use log::warn;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use studysmart_core::model::session::is_recordable_duration;
use studysmart_core::presentation::ControllerSettings;
use studysmart_core::time::{format_due_date, now_epoch_ms};
use studysmart_core::{
    core_version as core_version_inner, decode_color_list, encode_color_list,
    init_logging as init_logging_inner, parse_goal_hours, ping as ping_inner, seconds_to_hours,
    AppContainer, Database, Priority, Session, Subject, Task, MIN_SESSION_DURATION_SECS,
};

const DB_FILE_NAME: &str = "studysmart.sqlite3";
const DB_PATH_ENV: &str = "STUDYSMART_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Result of a single write use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Row id touched by the write, when there is one.
    pub id: Option<i64>,
    /// Snackbar-ready text.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: i64) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectItem {
    pub subject_id: i64,
    pub name: String,
    pub goal_hours: f32,
    /// ARGB card gradient.
    pub colors: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub task_id: i64,
    pub title: String,
    pub description: String,
    pub due_date: Option<i64>,
    /// `dd MMM yyyy` in local time.
    pub due_date_label: String,
    /// 0 low, 1 medium, 2 high.
    pub priority: i32,
    pub priority_label: String,
    pub related_to_subject: String,
    pub is_complete: bool,
    pub subject_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionItem {
    pub session_id: i64,
    pub subject_id: i64,
    pub related_to_subject: String,
    pub date: i64,
    pub duration_secs: i64,
}

/// Everything the dashboard renders in one read.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub ok: bool,
    pub subject_count: i64,
    pub goal_study_hours: f32,
    pub studied_hours: f32,
    pub subjects: Vec<SubjectItem>,
    pub upcoming_tasks: Vec<TaskItem>,
    pub recent_sessions: Vec<SessionItem>,
    pub message: String,
}

impl DashboardSnapshot {
    fn failure(message: String) -> Self {
        Self {
            ok: false,
            subject_count: 0,
            goal_study_hours: 0.0,
            studied_hours: 0.0,
            subjects: Vec::new(),
            upcoming_tasks: Vec::new(),
            recent_sessions: Vec::new(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorListResponse {
    pub ok: bool,
    pub colors: Vec<i32>,
    pub message: String,
}

/// Creates a subject, or updates it when `subject_id` is set.
///
/// `goal_hours` is raw form text; unparsable input counts as one hour.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn subject_save(
    subject_id: Option<i64>,
    name: String,
    goal_hours: String,
    colors: Vec<i32>,
) -> ActionResponse {
    let subject = Subject {
        subject_id,
        ..Subject::new(name.trim(), parse_goal_hours(&goal_hours), colors)
    };
    run_action("subject_save", "Couldn't save subject.", |app| {
        let id = app.subjects().upsert_subject(&subject)?;
        Ok(ActionResponse::success("Subject saved successfully", id))
    })
}

/// Deletes a subject with its tasks and sessions.
#[flutter_rust_bridge::frb(sync)]
pub fn subject_delete(subject_id: i64) -> ActionResponse {
    run_action("subject_delete", "Couldn't delete subject.", |app| {
        app.subjects().delete_subject(subject_id)?;
        Ok(ActionResponse::success(
            "Subject deleted successfully.",
            subject_id,
        ))
    })
}

/// Creates or updates a task bound to `subject_id`.
///
/// # FFI contract
/// - `priority` outside `0..=2` is rejected before any write.
/// - A missing `due_date` is stored as the current time.
#[flutter_rust_bridge::frb(sync)]
#[allow(clippy::too_many_arguments)]
pub fn task_save(
    task_id: Option<i64>,
    title: String,
    description: String,
    due_date: Option<i64>,
    priority: i32,
    subject_id: i64,
    is_complete: bool,
) -> ActionResponse {
    let Some(priority) = Priority::try_from_value(priority) else {
        return ActionResponse::failure(format!("Couldn't save task. unknown priority {priority}"));
    };
    run_action("task_save", "Couldn't save task.", |app| {
        let Some(subject) = app.subjects().get_subject_by_id(subject_id).current()? else {
            return Ok(ActionResponse::failure(
                "Please select subject related to the task",
            ));
        };
        let task = Task {
            task_id,
            title: title.trim().to_string(),
            description,
            due_date: Some(due_date.unwrap_or_else(now_epoch_ms)),
            priority,
            related_to_subject: subject.name,
            is_complete,
            task_subject_id: Some(subject_id),
        };
        let id = app.tasks().upsert_task(&task)?;
        Ok(ActionResponse::success("Save task successfully", id))
    })
}

/// Flips a task between the upcoming and completed lists.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle_complete(task_id: i64) -> ActionResponse {
    run_action("task_toggle_complete", "Couldn't update task.", |app| {
        let Some(task) = app.tasks().get_task_by_id(task_id).current()? else {
            return Ok(ActionResponse::failure("No task to update."));
        };
        let toggled = task.toggled();
        app.tasks().upsert_task(&toggled)?;
        let message = if toggled.is_complete {
            "Saved in completed tasks."
        } else {
            "Saved in upcoming tasks."
        };
        Ok(ActionResponse::success(message, task_id))
    })
}

/// Records a finished timer run for `subject_id`, dated now.
///
/// # FFI contract
/// - Durations under the recordable minimum never reach the store.
#[flutter_rust_bridge::frb(sync)]
pub fn session_save(subject_id: i64, duration_secs: i64) -> ActionResponse {
    if !is_recordable_duration(duration_secs) {
        return ActionResponse::failure(format!(
            "Single session can not be less than {MIN_SESSION_DURATION_SECS} seconds"
        ));
    }
    run_action("session_save", "Couldn't save session.", |app| {
        let Some(subject) = app.subjects().get_subject_by_id(subject_id).current()? else {
            return Ok(ActionResponse::failure(
                "Please select subject related to the session",
            ));
        };
        let session = Session::new(subject_id, subject.name, now_epoch_ms(), duration_secs);
        let id = app.sessions().insert_session(&session)?;
        Ok(ActionResponse::success("Session saved successfully", id))
    })
}

/// Reads dashboard totals and lists in one call.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_snapshot() -> DashboardSnapshot {
    let result = open_app().and_then(|app| {
        let snapshot = DashboardSnapshot {
            ok: true,
            subject_count: app.subjects().total_subject_count().current()?,
            goal_study_hours: app.subjects().total_goal_hours().current()?,
            studied_hours: seconds_to_hours(app.sessions().total_sessions_duration().current()?),
            subjects: app
                .subjects()
                .all_subjects()
                .current()?
                .into_iter()
                .filter_map(to_subject_item)
                .collect(),
            upcoming_tasks: app
                .tasks()
                .all_upcoming_tasks()
                .current()?
                .into_iter()
                .filter_map(to_task_item)
                .collect(),
            recent_sessions: app
                .sessions()
                .recent_five_sessions()
                .current()?
                .into_iter()
                .filter_map(to_session_item)
                .collect(),
            message: String::new(),
        };
        Ok(snapshot)
    });
    match result {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op=dashboard_snapshot error={err}");
            DashboardSnapshot::failure(format!("dashboard_snapshot failed: {err}"))
        }
    }
}

/// Serializes card colors the way the store does.
#[flutter_rust_bridge::frb(sync)]
pub fn color_list_encode(colors: Vec<i32>) -> String {
    encode_color_list(&colors)
}

#[flutter_rust_bridge::frb(sync)]
pub fn color_list_decode(text: String) -> ColorListResponse {
    match decode_color_list(&text) {
        Ok(colors) => ColorListResponse {
            ok: true,
            colors,
            message: String::new(),
        },
        Err(err) => ColorListResponse {
            ok: false,
            colors: Vec::new(),
            message: err.to_string(),
        },
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn open_app() -> Result<AppContainer, studysmart_core::RepoError> {
    let db = Database::open(resolve_db_path())?;
    Ok(AppContainer::from_database(
        Arc::new(db),
        ControllerSettings::default(),
    ))
}

fn run_action(
    op: &str,
    failure_prefix: &str,
    f: impl FnOnce(&AppContainer) -> studysmart_core::RepoResult<ActionResponse>,
) -> ActionResponse {
    match open_app().and_then(|app| f(&app)) {
        Ok(response) => response,
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op={op} error={err}");
            ActionResponse::failure(format!("{failure_prefix} {err}"))
        }
    }
}

// Rows read back from the store always carry ids; anything else is skipped.
fn to_subject_item(subject: Subject) -> Option<SubjectItem> {
    Some(SubjectItem {
        subject_id: subject.subject_id?,
        name: subject.name,
        goal_hours: subject.goal_hours,
        colors: subject.colors,
    })
}

fn to_task_item(task: Task) -> Option<TaskItem> {
    Some(TaskItem {
        task_id: task.task_id?,
        title: task.title,
        description: task.description,
        due_date: task.due_date,
        due_date_label: format_due_date(task.due_date),
        priority: task.priority.value(),
        priority_label: task.priority.title().to_string(),
        related_to_subject: task.related_to_subject,
        is_complete: task.is_complete,
        subject_id: task.task_subject_id,
    })
}

fn to_session_item(session: Session) -> Option<SessionItem> {
    Some(SessionItem {
        session_id: session.session_id?,
        subject_id: session.session_subject_id,
        related_to_subject: session.related_to_subject,
        date: session.date,
        duration_secs: session.duration,
    })
}
