//! Dashboard: totals, subject cards, upcoming tasks and recent sessions.

use super::{
    delete_selected_session, log_write, toggle_task_completion, write_failed, ControllerSettings,
};
use crate::model::progress::{parse_goal_hours, seconds_to_hours};
use crate::model::session::Session;
use crate::model::subject::{random_card_colors, Subject};
use crate::model::task::Task;
use crate::reactive::{
    offload, ControllerScope, Observable, SharedState, StatePublisher, StateSubscription, UiEvent,
    UiEventBus,
};
use crate::repo::session_repo::SessionRepository;
use crate::repo::subject_repo::SubjectRepository;
use crate::repo::task_repo::TaskRepository;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub total_subject_count: i64,
    pub total_studied_hours: f32,
    pub total_goal_study_hours: f32,
    pub subjects: Vec<Subject>,
    pub upcoming_tasks: Vec<Task>,
    pub recent_sessions: Vec<Session>,
    /// New-subject form.
    pub subject_name: String,
    pub goal_study_hours: String,
    pub subject_card_colors: Vec<i32>,
    /// Session picked for deletion.
    pub session: Option<Session>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            total_subject_count: 0,
            total_studied_hours: 0.0,
            total_goal_study_hours: 0.0,
            subjects: Vec::new(),
            upcoming_tasks: Vec::new(),
            recent_sessions: Vec::new(),
            subject_name: String::new(),
            goal_study_hours: String::new(),
            subject_card_colors: random_card_colors(),
            session: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    SubjectNameChanged(String),
    GoalStudyHoursChanged(String),
    SubjectCardColorsChanged(Vec<i32>),
    SaveSubject,
    TaskCompletionToggled(Task),
    DeleteSessionRequested(Session),
    DeleteSession,
}

#[derive(Clone)]
struct DashboardSources {
    subject_count: Observable<i64>,
    goal_hours: Observable<f32>,
    subjects: Observable<Vec<Subject>>,
    studied_seconds: Observable<i64>,
    upcoming_tasks: Observable<Vec<Task>>,
    recent_sessions: Observable<Vec<Session>>,
}

pub struct DashboardController {
    subjects: Arc<dyn SubjectRepository>,
    tasks: Arc<dyn TaskRepository>,
    sessions: Arc<dyn SessionRepository>,
    form: Arc<watch::Sender<DashboardState>>,
    state: SharedState<DashboardState>,
    events: UiEventBus,
    scope: ControllerScope,
}

impl DashboardController {
    /// Must be called inside a Tokio runtime.
    pub fn new(
        subjects: Arc<dyn SubjectRepository>,
        tasks: Arc<dyn TaskRepository>,
        sessions: Arc<dyn SessionRepository>,
        settings: ControllerSettings,
    ) -> Self {
        let initial = DashboardState::default();
        let (form, _) = watch::channel(initial.clone());
        let form = Arc::new(form);

        let sources = DashboardSources {
            subject_count: subjects.total_subject_count(),
            goal_hours: subjects.total_goal_hours(),
            subjects: subjects.all_subjects(),
            studied_seconds: sessions.total_sessions_duration(),
            upcoming_tasks: tasks.all_upcoming_tasks(),
            recent_sessions: sessions.recent_five_sessions(),
        };
        let upstream_form = Arc::clone(&form);
        let state = SharedState::launch(initial, settings.stop_timeout, move |publisher| {
            combine(publisher, upstream_form.subscribe(), sources.clone())
        });

        Self {
            subjects,
            tasks,
            sessions,
            form,
            state,
            events: UiEventBus::new(settings.event_buffer),
            scope: ControllerScope::new(),
        }
    }

    /// Observes the combined state; queries run while any subscription lives.
    pub fn state(&self) -> StateSubscription<DashboardState> {
        self.state.subscribe()
    }

    /// Last combined state, without subscribing.
    pub fn current_state(&self) -> DashboardState {
        self.state.value()
    }

    pub fn events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    /// Safe to call from threads outside the runtime; writes run on the
    /// runtime the controller was built in.
    pub fn on_event(&self, event: DashboardEvent) {
        match event {
            DashboardEvent::SubjectNameChanged(name) => {
                self.form.send_modify(|form| form.subject_name = name);
            }
            DashboardEvent::GoalStudyHoursChanged(hours) => {
                self.form.send_modify(|form| form.goal_study_hours = hours);
            }
            DashboardEvent::SubjectCardColorsChanged(colors) => {
                self.form.send_modify(|form| form.subject_card_colors = colors);
            }
            DashboardEvent::DeleteSessionRequested(session) => {
                self.form.send_modify(|form| form.session = Some(session));
            }
            DashboardEvent::SaveSubject => self.save_subject(),
            DashboardEvent::TaskCompletionToggled(task) => {
                toggle_task_completion(&self.scope, &self.events, &self.tasks, task);
            }
            DashboardEvent::DeleteSession => {
                let selected = self.form.borrow().session.clone();
                delete_selected_session(&self.scope, &self.events, &self.sessions, selected);
            }
        }
    }

    fn save_subject(&self) {
        let subject = {
            let form = self.form.borrow();
            Subject::new(
                form.subject_name.clone(),
                parse_goal_hours(&form.goal_study_hours),
                form.subject_card_colors.clone(),
            )
        };
        let subjects = Arc::clone(&self.subjects);
        let form = Arc::clone(&self.form);
        let events = self.events.clone();

        self.scope.launch(async move {
            let result = offload(move || subjects.upsert_subject(&subject)).await;
            log_write("save_subject", &result);
            match result {
                Ok(_) => {
                    form.send_modify(|form| {
                        form.subject_name.clear();
                        form.goal_study_hours.clear();
                        form.subject_card_colors = random_card_colors();
                    });
                    events.emit(UiEvent::snackbar("Subject saved successfully"));
                }
                Err(err) => events.emit(write_failed("Couldn't save subject.", &err)),
            }
        });
    }
}

async fn combine(
    publisher: StatePublisher<DashboardState>,
    mut form: watch::Receiver<DashboardState>,
    sources: DashboardSources,
) {
    let mut subject_count = sources.subject_count.subscribe();
    let mut goal_hours = sources.goal_hours.subscribe();
    let mut subjects = sources.subjects.subscribe();
    let mut studied_seconds = sources.studied_seconds.subscribe();
    let mut upcoming_tasks = sources.upcoming_tasks.subscribe();
    let mut recent_sessions = sources.recent_sessions.subscribe();

    loop {
        if let (
            Some(count),
            Some(goal),
            Some(subject_list),
            Some(seconds),
            Some(tasks),
            Some(recent),
        ) = (
            subject_count.latest(),
            goal_hours.latest(),
            subjects.latest(),
            studied_seconds.latest(),
            upcoming_tasks.latest(),
            recent_sessions.latest(),
        ) {
            let next = DashboardState {
                total_subject_count: count,
                total_goal_study_hours: goal,
                subjects: subject_list,
                total_studied_hours: seconds_to_hours(seconds),
                upcoming_tasks: tasks,
                recent_sessions: recent,
                ..form.borrow().clone()
            };
            publisher.publish(next);
        }

        let alive = tokio::select! {
            changed = form.changed() => changed.is_ok(),
            alive = subject_count.changed() => alive,
            alive = goal_hours.changed() => alive,
            alive = subjects.changed() => alive,
            alive = studied_seconds.changed() => alive,
            alive = upcoming_tasks.changed() => alive,
            alive = recent_sessions.changed() => alive,
        };
        if !alive {
            break;
        }
    }
}
