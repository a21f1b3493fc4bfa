//! Session screen: record timed sessions and browse history.

use super::{delete_selected_session, log_write, write_failed, ControllerSettings};
use crate::model::session::{is_recordable_duration, Session, MIN_SESSION_DURATION_SECS};
use crate::model::subject::{Subject, SubjectId};
use crate::reactive::{
    offload, ControllerScope, Observable, SharedState, StatePublisher, StateSubscription, UiEvent,
    UiEventBus,
};
use crate::repo::session_repo::SessionRepository;
use crate::repo::subject_repo::SubjectRepository;
use crate::time::now_epoch_ms;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

const SELECT_SUBJECT_MESSAGE: &str = "Please select subject related to the session";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub subjects: Vec<Subject>,
    /// Newest first.
    pub sessions: Vec<Session>,
    pub related_to_subject: Option<String>,
    pub subject_id: Option<SubjectId>,
    pub session: Option<Session>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RelatedSubjectChanged(Subject),
    /// Re-binds the subject a running timer was started for.
    SubjectAssociationRestored {
        subject_id: Option<SubjectId>,
        related_to_subject: Option<String>,
    },
    SaveSession {
        duration_secs: i64,
    },
    DeleteSessionRequested(Session),
    DeleteSession,
    /// Reminds the user to pick a subject if none is selected.
    CheckSubjectSelected,
}

#[derive(Clone)]
struct SessionSources {
    subjects: Observable<Vec<Subject>>,
    sessions: Observable<Vec<Session>>,
}

pub struct SessionController {
    sessions: Arc<dyn SessionRepository>,
    form: Arc<watch::Sender<SessionState>>,
    state: SharedState<SessionState>,
    events: UiEventBus,
    scope: ControllerScope,
}

impl SessionController {
    /// Must be called inside a Tokio runtime.
    pub fn new(
        subjects: Arc<dyn SubjectRepository>,
        sessions: Arc<dyn SessionRepository>,
        settings: ControllerSettings,
    ) -> Self {
        let (form, _) = watch::channel(SessionState::default());
        let form = Arc::new(form);

        let sources = SessionSources {
            subjects: subjects.all_subjects(),
            sessions: sessions.all_sessions(),
        };
        let upstream_form = Arc::clone(&form);
        let state = SharedState::launch(
            SessionState::default(),
            settings.stop_timeout,
            move |publisher| combine(publisher, upstream_form.subscribe(), sources.clone()),
        );

        Self {
            sessions,
            form,
            state,
            events: UiEventBus::new(settings.event_buffer),
            scope: ControllerScope::new(),
        }
    }

    pub fn state(&self) -> StateSubscription<SessionState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> SessionState {
        self.state.value()
    }

    pub fn events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn on_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::RelatedSubjectChanged(subject) => self.form.send_modify(|form| {
                form.related_to_subject = Some(subject.name);
                form.subject_id = subject.subject_id;
            }),
            SessionEvent::SubjectAssociationRestored {
                subject_id,
                related_to_subject,
            } => self.form.send_modify(|form| {
                form.subject_id = subject_id;
                form.related_to_subject = related_to_subject;
            }),
            SessionEvent::SaveSession { duration_secs } => self.save_session(duration_secs),
            SessionEvent::DeleteSessionRequested(session) => {
                self.form.send_modify(|form| form.session = Some(session));
            }
            SessionEvent::DeleteSession => {
                let selected = self.form.borrow().session.clone();
                delete_selected_session(&self.scope, &self.events, &self.sessions, selected);
            }
            SessionEvent::CheckSubjectSelected => {
                if self.selected_subject().is_none() {
                    self.events.emit(UiEvent::snackbar(SELECT_SUBJECT_MESSAGE));
                }
            }
        }
    }

    fn selected_subject(&self) -> Option<(SubjectId, String)> {
        let form = self.form.borrow();
        form.subject_id.zip(form.related_to_subject.clone())
    }

    fn save_session(&self, duration_secs: i64) {
        if !is_recordable_duration(duration_secs) {
            self.events.emit(UiEvent::snackbar(format!(
                "Single session can not be less than {MIN_SESSION_DURATION_SECS} seconds"
            )));
            return;
        }
        let Some((subject_id, related_to_subject)) = self.selected_subject() else {
            self.events.emit(UiEvent::snackbar(SELECT_SUBJECT_MESSAGE));
            return;
        };

        let session = Session::new(subject_id, related_to_subject, now_epoch_ms(), duration_secs);
        let sessions = Arc::clone(&self.sessions);
        let events = self.events.clone();
        self.scope.launch(async move {
            let result = offload(move || sessions.insert_session(&session)).await;
            log_write("save_session", &result);
            match result {
                Ok(_) => events.emit(UiEvent::snackbar("Session saved successfully")),
                Err(err) => events.emit(write_failed("Couldn't save session.", &err)),
            }
        });
    }
}

async fn combine(
    publisher: StatePublisher<SessionState>,
    mut form: watch::Receiver<SessionState>,
    sources: SessionSources,
) {
    let mut subjects = sources.subjects.subscribe();
    let mut sessions = sources.sessions.subscribe();

    loop {
        if let (Some(subject_list), Some(session_list)) = (subjects.latest(), sessions.latest()) {
            publisher.publish(SessionState {
                subjects: subject_list,
                sessions: session_list,
                ..form.borrow().clone()
            });
        }

        let alive = tokio::select! {
            changed = form.changed() => changed.is_ok(),
            alive = subjects.changed() => alive,
            alive = sessions.changed() => alive,
        };
        if !alive {
            break;
        }
    }
}
