use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use studysmart_core::presentation::{
    ControllerSettings, DashboardEvent, SessionController, SessionEvent, SubjectEvent, TaskEvent,
};
use studysmart_core::reactive::StateSubscription;
use studysmart_core::{
    AppContainer, Observable, Priority, RepoResult, Session, SessionId, SessionRepository,
    SnackbarDuration, Subject, SubjectId, Task, UiEvent,
};
use tokio::sync::broadcast;

const WAIT: Duration = Duration::from_secs(5);

async fn next_event(rx: &mut broadcast::Receiver<UiEvent>) -> UiEvent {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("event should arrive")
        .expect("event bus open")
}

async fn wait_state<S: Clone>(
    subscription: &mut StateSubscription<S>,
    predicate: impl FnMut(&S) -> bool,
) -> S {
    tokio::time::timeout(WAIT, subscription.wait_for(predicate))
        .await
        .expect("state should converge")
        .expect("state owner alive")
}

fn add_subject(app: &AppContainer, name: &str, goal: f32) -> Subject {
    let subject = Subject::new(name, goal, vec![16711680, 65280]);
    let id = app.subjects().upsert_subject(&subject).unwrap();
    subject.with_id(id)
}

#[tokio::test]
async fn dashboard_combines_totals_and_sorted_tasks() {
    let app = AppContainer::in_memory().unwrap();
    let physics = add_subject(&app, "Physics", 10.0);
    let physics_id = physics.subject_id.unwrap();
    add_subject(&app, "Maths", 2.5);
    for (title, priority) in [("low", Priority::Low), ("high", Priority::High)] {
        app.tasks()
            .upsert_task(&Task {
                due_date: Some(100),
                priority,
                task_subject_id: Some(physics_id),
                ..Task::new(title)
            })
            .unwrap();
    }
    app.sessions()
        .insert_session(&Session::new(physics_id, "Physics", 1_000, 5_400))
        .unwrap();

    let dashboard = app.dashboard();
    let mut state = dashboard.state();
    let snapshot = wait_state(&mut state, |state| state.total_subject_count == 2).await;

    assert_eq!(snapshot.total_goal_study_hours, 12.5);
    assert_eq!(snapshot.total_studied_hours, 1.5);
    assert_eq!(snapshot.subjects[0], physics);
    let titles: Vec<_> = snapshot
        .upcoming_tasks
        .iter()
        .map(|task| task.title.as_str())
        .collect();
    assert_eq!(titles, ["high", "low"]);
    assert_eq!(snapshot.recent_sessions.len(), 1);
}

#[tokio::test]
async fn dashboard_save_subject_resets_form_after_success() {
    let app = AppContainer::in_memory().unwrap();
    let dashboard = app.dashboard();
    let mut state = dashboard.state();
    let mut events = dashboard.events();

    dashboard.on_event(DashboardEvent::SubjectNameChanged("Chemistry".to_string()));
    dashboard.on_event(DashboardEvent::GoalStudyHoursChanged("4".to_string()));
    dashboard.on_event(DashboardEvent::SaveSubject);

    assert_eq!(
        next_event(&mut events).await,
        UiEvent::snackbar("Subject saved successfully")
    );
    let snapshot = wait_state(&mut state, |state| {
        state.subjects.len() == 1 && state.subject_name.is_empty()
    })
    .await;
    assert_eq!(snapshot.subjects[0].name, "Chemistry");
    assert_eq!(snapshot.subjects[0].goal_hours, 4.0);
    assert!(snapshot.goal_study_hours.is_empty());
    assert_eq!(snapshot.subject_card_colors.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dashboard_intents_from_a_plain_thread_reach_the_store() {
    let app = AppContainer::in_memory().unwrap();
    let dashboard = app.dashboard();
    let mut events = dashboard.events();

    std::thread::scope(|ui| {
        ui.spawn(|| {
            dashboard.on_event(DashboardEvent::SubjectNameChanged("Biology".to_string()));
            dashboard.on_event(DashboardEvent::GoalStudyHoursChanged("3".to_string()));
            dashboard.on_event(DashboardEvent::SaveSubject);
        });
    });

    assert_eq!(
        next_event(&mut events).await,
        UiEvent::snackbar("Subject saved successfully")
    );
    let saved = app.subjects().all_subjects().current().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].name, "Biology");
}

#[tokio::test]
async fn dashboard_write_failure_is_a_long_snackbar() {
    let app = AppContainer::in_memory().unwrap();
    let dashboard = app.dashboard();
    let mut events = dashboard.events();

    dashboard.on_event(DashboardEvent::SubjectNameChanged("Negative".to_string()));
    dashboard.on_event(DashboardEvent::GoalStudyHoursChanged("-3".to_string()));
    dashboard.on_event(DashboardEvent::SaveSubject);

    match next_event(&mut events).await {
        UiEvent::ShowSnackbar { message, duration } => {
            assert!(message.starts_with("Couldn't save subject. "), "{message}");
            assert_eq!(duration, SnackbarDuration::Long);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(app.subjects().total_subject_count().current().unwrap(), 0);
}

#[tokio::test]
async fn dashboard_toggle_and_session_delete_report_outcomes() {
    let app = AppContainer::in_memory().unwrap();
    let subject_id = add_subject(&app, "Physics", 10.0).subject_id.unwrap();
    let task_id = app
        .tasks()
        .upsert_task(&Task {
            task_subject_id: Some(subject_id),
            ..Task::new("Read")
        })
        .unwrap();
    let session_id = app
        .sessions()
        .insert_session(&Session::new(subject_id, "Physics", 1, 60))
        .unwrap();
    let dashboard = app.dashboard();
    let mut events = dashboard.events();

    let task = app.tasks().get_task_by_id(task_id).current().unwrap().unwrap();
    dashboard.on_event(DashboardEvent::TaskCompletionToggled(task));
    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Saved in completed tasks.")
    );

    let session = Session {
        session_id: Some(session_id),
        ..Session::new(subject_id, "Physics", 1, 60)
    };
    dashboard.on_event(DashboardEvent::DeleteSessionRequested(session));
    dashboard.on_event(DashboardEvent::DeleteSession);
    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Session deleted successfully")
    );
    assert_eq!(app.sessions().total_sessions_duration().current().unwrap(), 0);
}

/// Counts inserts that reach the store.
struct CountingSessions {
    inner: Arc<dyn SessionRepository>,
    inserts: AtomicUsize,
}

impl SessionRepository for CountingSessions {
    fn insert_session(&self, session: &Session) -> RepoResult<SessionId> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_session(session)
    }

    fn delete_session(&self, session_id: SessionId) -> RepoResult<()> {
        self.inner.delete_session(session_id)
    }

    fn all_sessions(&self) -> Observable<Vec<Session>> {
        self.inner.all_sessions()
    }

    fn recent_five_sessions(&self) -> Observable<Vec<Session>> {
        self.inner.recent_five_sessions()
    }

    fn recent_ten_sessions_for_subject(&self, subject_id: SubjectId) -> Observable<Vec<Session>> {
        self.inner.recent_ten_sessions_for_subject(subject_id)
    }

    fn total_sessions_duration(&self) -> Observable<i64> {
        self.inner.total_sessions_duration()
    }

    fn total_sessions_duration_by_subject(&self, subject_id: SubjectId) -> Observable<i64> {
        self.inner.total_sessions_duration_by_subject(subject_id)
    }
}

#[tokio::test]
async fn session_shorter_than_36_seconds_never_reaches_repository() {
    let app = AppContainer::in_memory().unwrap();
    let physics = add_subject(&app, "Physics", 10.0);
    let counting = Arc::new(CountingSessions {
        inner: app.sessions(),
        inserts: AtomicUsize::new(0),
    });
    let controller = SessionController::new(
        app.subjects(),
        Arc::clone(&counting) as Arc<dyn SessionRepository>,
        app.settings(),
    );
    let mut events = controller.events();
    controller.on_event(SessionEvent::RelatedSubjectChanged(physics));

    controller.on_event(SessionEvent::SaveSession { duration_secs: 35 });
    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Single session can not be less than 36 seconds")
    );
    assert_eq!(counting.inserts.load(Ordering::SeqCst), 0);

    controller.on_event(SessionEvent::SaveSession { duration_secs: 36 });
    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Session saved successfully")
    );
    assert_eq!(counting.inserts.load(Ordering::SeqCst), 1);

    let mut state = controller.state();
    let snapshot = wait_state(&mut state, |state| state.sessions.len() == 1).await;
    assert_eq!(snapshot.sessions[0].duration, 36);
    assert_eq!(snapshot.sessions[0].related_to_subject, "Physics");
}

#[tokio::test]
async fn session_save_requires_subject() {
    let app = AppContainer::in_memory().unwrap();
    let controller = app.session();
    let mut events = controller.events();

    controller.on_event(SessionEvent::CheckSubjectSelected);
    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Please select subject related to the session")
    );

    controller.on_event(SessionEvent::SaveSession { duration_secs: 600 });
    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Please select subject related to the session")
    );

    let physics_id = add_subject(&app, "Physics", 1.0).subject_id;
    controller.on_event(SessionEvent::SubjectAssociationRestored {
        subject_id: physics_id,
        related_to_subject: Some("Physics".to_string()),
    });
    controller.on_event(SessionEvent::SaveSession { duration_secs: 600 });
    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Session saved successfully")
    );
}

#[tokio::test]
async fn subject_detail_loads_progress_and_deletes_with_navigation() {
    let app = AppContainer::in_memory().unwrap();
    let subject_id = add_subject(&app, "Physics", 10.0).subject_id.unwrap();
    app.sessions()
        .insert_session(&Session::new(subject_id, "Physics", 1, 18_000))
        .unwrap();
    app.tasks()
        .upsert_task(&Task {
            is_complete: true,
            task_subject_id: Some(subject_id),
            ..Task::new("Done already")
        })
        .unwrap();

    let detail = app.subject_detail(subject_id);
    let mut state = detail.state();
    let mut events = detail.events();
    let snapshot = wait_state(&mut state, |state| {
        state.current_subject_id.is_some() && state.studied_hours > 0.0
    })
    .await;
    assert_eq!(snapshot.subject_name, "Physics");
    assert_eq!(snapshot.goal_study_hours, "10");
    assert_eq!(snapshot.studied_hours, 5.0);
    assert_eq!(snapshot.progress, 0.5);
    assert_eq!(snapshot.completed_tasks.len(), 1);

    detail.on_event(SubjectEvent::GoalStudyHoursChanged("0".to_string()));
    let snapshot = wait_state(&mut state, |state| state.goal_study_hours == "0").await;
    assert_eq!(snapshot.progress, 1.0);

    detail.on_event(SubjectEvent::DeleteSubject);
    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Subject deleted successfully.")
    );
    assert_eq!(next_event(&mut events).await, UiEvent::NavigateUp);
    assert!(app
        .tasks()
        .completed_tasks_for_subject(subject_id)
        .current()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn subject_detail_without_subject_has_nothing_to_delete() {
    let app = AppContainer::in_memory().unwrap();
    let detail = app.subject_detail(404);
    let mut events = detail.events();

    detail.on_event(SubjectEvent::DeleteSubject);
    assert_eq!(
        next_event(&mut events).await,
        UiEvent::snackbar("No subject to delete.")
    );
}

#[tokio::test]
async fn task_detail_requires_subject_then_saves_and_navigates() {
    let app = AppContainer::in_memory().unwrap();
    let subject_id = add_subject(&app, "Physics", 10.0).subject_id.unwrap();

    let unbound = app.task_detail(None, None);
    let mut events = unbound.events();
    unbound.on_event(TaskEvent::TitleChanged("Revise".to_string()));
    unbound.on_event(TaskEvent::SaveTask);
    assert_eq!(
        next_event(&mut events).await,
        UiEvent::snackbar_long("Please select subject related to the task")
    );

    let bound = app.task_detail(None, Some(subject_id));
    let mut state = bound.state();
    let mut events = bound.events();
    wait_state(&mut state, |state| state.subject_id == Some(subject_id)).await;
    bound.on_event(TaskEvent::TitleChanged("Revise".to_string()));
    bound.on_event(TaskEvent::PriorityChanged(Priority::High));
    bound.on_event(TaskEvent::SaveTask);

    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Save task successfully")
    );
    assert_eq!(next_event(&mut events).await, UiEvent::NavigateUp);

    let saved = app.tasks().all_upcoming_tasks().current().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].related_to_subject, "Physics");
    assert_eq!(saved[0].priority, Priority::High);
    assert!(saved[0].due_date.is_some(), "unset due date is saved as now");
}

#[tokio::test]
async fn task_detail_edits_and_deletes_existing_task() {
    let app = AppContainer::in_memory().unwrap();
    let subject_id = add_subject(&app, "Physics", 10.0).subject_id.unwrap();
    let task_id = app
        .tasks()
        .upsert_task(&Task {
            due_date: Some(500),
            related_to_subject: "Physics".to_string(),
            task_subject_id: Some(subject_id),
            ..Task::new("Old title")
        })
        .unwrap();

    let detail = app.task_detail(Some(task_id), None);
    let mut state = detail.state();
    let mut events = detail.events();
    let loaded = wait_state(&mut state, |state| state.current_task_id.is_some()).await;
    assert_eq!(loaded.title, "Old title");
    assert_eq!(loaded.due_date, Some(500));

    detail.on_event(TaskEvent::TitleChanged("New title".to_string()));
    detail.on_event(TaskEvent::CompletionToggled);
    detail.on_event(TaskEvent::SaveTask);
    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Save task successfully")
    );
    assert_eq!(next_event(&mut events).await, UiEvent::NavigateUp);
    let stored = app.tasks().get_task_by_id(task_id).current().unwrap().unwrap();
    assert_eq!(stored.title, "New title");
    assert!(stored.is_complete);
    assert_eq!(stored.due_date, Some(500));

    detail.on_event(TaskEvent::DeleteTask);
    assert_eq!(
        next_event(&mut events).await.message(),
        Some("Task deleted successfully.")
    );
    assert_eq!(next_event(&mut events).await, UiEvent::NavigateUp);
    assert_eq!(app.tasks().get_task_by_id(task_id).current().unwrap(), None);
}

#[tokio::test]
async fn late_event_subscriber_misses_earlier_notification() {
    let app = AppContainer::in_memory().unwrap();
    let detail = app.task_detail(None, None);

    detail.on_event(TaskEvent::DeleteTask);
    let mut late = detail.events();

    assert!(matches!(
        late.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn dashboard_stops_queries_after_timeout_and_keeps_cached_state() {
    let base = AppContainer::in_memory().unwrap();
    let app = AppContainer::from_database(
        Arc::clone(base.database()),
        ControllerSettings {
            stop_timeout: Duration::from_millis(50),
            ..base.settings()
        },
    );
    add_subject(&app, "Physics", 10.0);
    let dashboard = app.dashboard();

    let mut first = dashboard.state();
    wait_state(&mut first, |state| state.total_subject_count == 1).await;
    drop(first);
    tokio::time::sleep(Duration::from_millis(300)).await;

    add_subject(&app, "Maths", 1.0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dashboard.current_state().total_subject_count, 1);

    let mut second = dashboard.state();
    assert_eq!(second.current().total_subject_count, 1);
    wait_state(&mut second, |state| state.total_subject_count == 2).await;
}

#[tokio::test]
async fn seeded_fixtures_drive_the_dashboard() {
    let app = AppContainer::in_memory().unwrap();
    studysmart_core::fixtures::seed_sample_data(
        app.subjects().as_ref(),
        app.tasks().as_ref(),
        app.sessions().as_ref(),
    )
    .unwrap();

    let dashboard = app.dashboard();
    let mut state = dashboard.state();
    let snapshot = wait_state(&mut state, |state| state.total_subject_count == 5).await;
    assert_eq!(snapshot.upcoming_tasks.len(), 3);
    assert!(snapshot
        .upcoming_tasks
        .windows(2)
        .all(|pair| pair[0].due_date <= pair[1].due_date));
    assert_eq!(snapshot.recent_sessions.len(), 5);
    assert_eq!(snapshot.recent_sessions[0].related_to_subject, "Geology");
}

#[tokio::test]
async fn constant_observables_feed_previews() {
    let preview = Observable::constant(studysmart_core::fixtures::sample_subjects());
    let names = preview.map(|subjects| {
        subjects
            .into_iter()
            .map(|subject| subject.name)
            .collect::<Vec<_>>()
    });
    let live = names.subscribe();
    assert_eq!(live.latest().unwrap()[1], "Physics");
}
