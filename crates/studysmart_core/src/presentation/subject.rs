//! Subject detail: edit form, per-subject tasks, sessions and progress.

use super::{
    delete_selected_session, log_write, toggle_task_completion, write_failed, ControllerSettings,
};
use crate::model::progress::{parse_goal_hours, progress_from_input, seconds_to_hours};
use crate::model::session::Session;
use crate::model::subject::{random_card_colors, Subject, SubjectId};
use crate::model::task::Task;
use crate::reactive::{
    offload, ControllerScope, Observable, SharedState, StatePublisher, StateSubscription, UiEvent,
    UiEventBus,
};
use crate::repo::session_repo::SessionRepository;
use crate::repo::subject_repo::SubjectRepository;
use crate::repo::task_repo::TaskRepository;
use log::warn;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectState {
    /// Set once the subject has been loaded.
    pub current_subject_id: Option<SubjectId>,
    pub subject_name: String,
    pub goal_study_hours: String,
    pub subject_card_colors: Vec<i32>,
    pub studied_hours: f32,
    /// `studied_hours` over the goal typed in the form, in `[0, 1]`.
    pub progress: f32,
    pub upcoming_tasks: Vec<Task>,
    pub completed_tasks: Vec<Task>,
    pub recent_sessions: Vec<Session>,
    pub session: Option<Session>,
}

impl Default for SubjectState {
    fn default() -> Self {
        Self {
            current_subject_id: None,
            subject_name: String::new(),
            goal_study_hours: String::new(),
            subject_card_colors: random_card_colors(),
            studied_hours: 0.0,
            progress: 0.0,
            upcoming_tasks: Vec::new(),
            completed_tasks: Vec::new(),
            recent_sessions: Vec::new(),
            session: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubjectEvent {
    SubjectNameChanged(String),
    GoalStudyHoursChanged(String),
    SubjectCardColorsChanged(Vec<i32>),
    UpdateSubject,
    DeleteSubject,
    TaskCompletionToggled(Task),
    DeleteSessionRequested(Session),
    DeleteSession,
}

#[derive(Clone)]
struct SubjectSources {
    upcoming_tasks: Observable<Vec<Task>>,
    completed_tasks: Observable<Vec<Task>>,
    recent_sessions: Observable<Vec<Session>>,
    studied_seconds: Observable<i64>,
}

pub struct SubjectController {
    subjects: Arc<dyn SubjectRepository>,
    tasks: Arc<dyn TaskRepository>,
    sessions: Arc<dyn SessionRepository>,
    form: Arc<watch::Sender<SubjectState>>,
    state: SharedState<SubjectState>,
    events: UiEventBus,
    scope: ControllerScope,
}

impl SubjectController {
    /// Opens the detail screen for `subject_id` and starts loading it into
    /// the form. Must be called inside a Tokio runtime.
    pub fn new(
        subject_id: SubjectId,
        subjects: Arc<dyn SubjectRepository>,
        tasks: Arc<dyn TaskRepository>,
        sessions: Arc<dyn SessionRepository>,
        settings: ControllerSettings,
    ) -> Self {
        let initial = SubjectState::default();
        let (form, _) = watch::channel(initial.clone());
        let form = Arc::new(form);

        let sources = SubjectSources {
            upcoming_tasks: tasks.upcoming_tasks_for_subject(subject_id),
            completed_tasks: tasks.completed_tasks_for_subject(subject_id),
            recent_sessions: sessions.recent_ten_sessions_for_subject(subject_id),
            studied_seconds: sessions.total_sessions_duration_by_subject(subject_id),
        };
        let upstream_form = Arc::clone(&form);
        let state = SharedState::launch(initial, settings.stop_timeout, move |publisher| {
            combine(publisher, upstream_form.subscribe(), sources.clone())
        });

        let controller = Self {
            subjects,
            tasks,
            sessions,
            form,
            state,
            events: UiEventBus::new(settings.event_buffer),
            scope: ControllerScope::new(),
        };
        controller.fetch_subject(subject_id);
        controller
    }

    pub fn state(&self) -> StateSubscription<SubjectState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> SubjectState {
        self.state.value()
    }

    pub fn events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn on_event(&self, event: SubjectEvent) {
        match event {
            SubjectEvent::SubjectNameChanged(name) => {
                self.form.send_modify(|form| form.subject_name = name);
            }
            SubjectEvent::GoalStudyHoursChanged(hours) => {
                self.form.send_modify(|form| form.goal_study_hours = hours);
            }
            SubjectEvent::SubjectCardColorsChanged(colors) => {
                self.form.send_modify(|form| form.subject_card_colors = colors);
            }
            SubjectEvent::DeleteSessionRequested(session) => {
                self.form.send_modify(|form| form.session = Some(session));
            }
            SubjectEvent::UpdateSubject => self.update_subject(),
            SubjectEvent::DeleteSubject => self.delete_subject(),
            SubjectEvent::TaskCompletionToggled(task) => {
                toggle_task_completion(&self.scope, &self.events, &self.tasks, task);
            }
            SubjectEvent::DeleteSession => {
                let selected = self.form.borrow().session.clone();
                delete_selected_session(&self.scope, &self.events, &self.sessions, selected);
            }
        }
    }

    fn fetch_subject(&self, subject_id: SubjectId) {
        let lookup = self.subjects.get_subject_by_id(subject_id);
        let form = Arc::clone(&self.form);
        self.scope.launch(async move {
            match offload(move || lookup.current()).await {
                Ok(Some(subject)) => form.send_modify(|form| {
                    form.current_subject_id = subject.subject_id;
                    form.subject_name = subject.name;
                    form.goal_study_hours = subject.goal_hours.to_string();
                    form.subject_card_colors = subject.colors;
                }),
                Ok(None) => {}
                Err(err) => warn!(
                    "event=subject_load module=presentation status=error subject_id={subject_id} error={err}"
                ),
            }
        });
    }

    fn update_subject(&self) {
        let subject = {
            let form = self.form.borrow();
            Subject {
                subject_id: form.current_subject_id,
                name: form.subject_name.clone(),
                goal_hours: parse_goal_hours(&form.goal_study_hours),
                colors: form.subject_card_colors.clone(),
            }
        };
        let subjects = Arc::clone(&self.subjects);
        let events = self.events.clone();

        self.scope.launch(async move {
            let result = offload(move || subjects.upsert_subject(&subject)).await;
            log_write("update_subject", &result);
            match result {
                Ok(_) => events.emit(UiEvent::snackbar("Subject updated successfully.")),
                Err(err) => events.emit(write_failed("Couldn't update subject.", &err)),
            }
        });
    }

    fn delete_subject(&self) {
        let current = self.form.borrow().current_subject_id;
        let Some(subject_id) = current else {
            self.events.emit(UiEvent::snackbar("No subject to delete."));
            return;
        };
        let subjects = Arc::clone(&self.subjects);
        let events = self.events.clone();

        self.scope.launch(async move {
            let result = offload(move || subjects.delete_subject(subject_id)).await;
            log_write("delete_subject", &result);
            match result {
                Ok(()) => {
                    events.emit(UiEvent::snackbar("Subject deleted successfully."));
                    events.emit(UiEvent::NavigateUp);
                }
                Err(err) => events.emit(write_failed("Couldn't delete subject.", &err)),
            }
        });
    }
}

async fn combine(
    publisher: StatePublisher<SubjectState>,
    mut form: watch::Receiver<SubjectState>,
    sources: SubjectSources,
) {
    let mut upcoming_tasks = sources.upcoming_tasks.subscribe();
    let mut completed_tasks = sources.completed_tasks.subscribe();
    let mut recent_sessions = sources.recent_sessions.subscribe();
    let mut studied_seconds = sources.studied_seconds.subscribe();

    loop {
        if let (Some(upcoming), Some(completed), Some(recent), Some(seconds)) = (
            upcoming_tasks.latest(),
            completed_tasks.latest(),
            recent_sessions.latest(),
            studied_seconds.latest(),
        ) {
            let local = form.borrow().clone();
            let studied_hours = seconds_to_hours(seconds);
            let next = SubjectState {
                studied_hours,
                progress: progress_from_input(studied_hours, &local.goal_study_hours),
                upcoming_tasks: upcoming,
                completed_tasks: completed,
                recent_sessions: recent,
                ..local
            };
            publisher.publish(next);
        }

        let alive = tokio::select! {
            changed = form.changed() => changed.is_ok(),
            alive = upcoming_tasks.changed() => alive,
            alive = completed_tasks.changed() => alive,
            alive = recent_sessions.changed() => alive,
            alive = studied_seconds.changed() => alive,
        };
        if !alive {
            break;
        }
    }
}
