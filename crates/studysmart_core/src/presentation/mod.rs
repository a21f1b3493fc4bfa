//! Screen controllers.
//!
//! # Responsibility
//! - Merge each screen's local form record with repository live queries into
//!   one observable display state.
//! - Turn user intents into form updates or background repository writes.
//! - Report write outcomes on the screen's one-shot `UiEventBus`.
//!
//! # Invariants
//! - Combination is pure; query results are never mutated in place.
//! - Every write failure becomes a `Long` snackbar carrying the error text.
//! - Nothing is retried.

use crate::model::session::Session;
use crate::model::task::Task;
use crate::reactive::{offload, ControllerScope, UiEvent, UiEventBus};
use crate::repo::session_repo::SessionRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

pub mod dashboard;
pub mod session;
pub mod subject;
pub mod task;

pub use dashboard::{DashboardController, DashboardEvent, DashboardState};
pub use session::{SessionController, SessionEvent, SessionState};
pub use subject::{SubjectController, SubjectEvent, SubjectState};
pub use task::{TaskController, TaskEvent, TaskState};

/// Default grace period before an unobserved state stops its queries.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(5_000);
/// Default one-shot event buffer per controller.
pub const DEFAULT_EVENT_BUFFER: usize = 16;

/// Tunables shared by every controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub stop_timeout: Duration,
    pub event_buffer: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

fn log_write<T>(operation: &'static str, result: &RepoResult<T>) {
    match result {
        Ok(_) => info!("event=controller_write module=presentation status=ok op={operation}"),
        Err(err) => warn!(
            "event=controller_write module=presentation status=error op={operation} error={err}"
        ),
    }
}

fn write_failed(prefix: &str, err: &RepoError) -> UiEvent {
    UiEvent::snackbar_long(format!("{prefix} {err}"))
}

/// Flips a task's completion flag in the background.
fn toggle_task_completion(
    scope: &ControllerScope,
    events: &UiEventBus,
    tasks: &Arc<dyn TaskRepository>,
    task: Task,
) {
    let events = events.clone();
    let tasks = Arc::clone(tasks);
    scope.launch(async move {
        let toggled = task.toggled();
        let message = if toggled.is_complete {
            "Saved in completed tasks."
        } else {
            "Saved in upcoming tasks."
        };
        let result = offload(move || tasks.upsert_task(&toggled)).await;
        log_write("toggle_task", &result);
        match result {
            Ok(_) => events.emit(UiEvent::snackbar(message)),
            Err(err) => events.emit(write_failed("Couldn't update task.", &err)),
        }
    });
}

/// Deletes the session picked for deletion.
///
/// With nothing picked this is a no-op that still reports success.
fn delete_selected_session(
    scope: &ControllerScope,
    events: &UiEventBus,
    sessions: &Arc<dyn SessionRepository>,
    selected: Option<Session>,
) {
    let events = events.clone();
    let sessions = Arc::clone(sessions);
    scope.launch(async move {
        let result = match selected.and_then(|session| session.session_id) {
            Some(session_id) => offload(move || sessions.delete_session(session_id)).await,
            None => Ok(()),
        };
        log_write("delete_session", &result);
        match result {
            Ok(()) => events.emit(UiEvent::snackbar("Session deleted successfully")),
            Err(err) => events.emit(write_failed("Couldn't delete session.", &err)),
        }
    });
}
