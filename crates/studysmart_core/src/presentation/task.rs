//! Task detail: create or edit one task.

use super::{log_write, write_failed, ControllerSettings};
use crate::model::subject::{Subject, SubjectId};
use crate::model::task::{Priority, Task, TaskId};
use crate::reactive::{
    offload, ControllerScope, Observable, SharedState, StatePublisher, StateSubscription, UiEvent,
    UiEventBus,
};
use crate::repo::subject_repo::SubjectRepository;
use crate::repo::task_repo::TaskRepository;
use crate::time::now_epoch_ms;
use log::warn;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskState {
    pub current_task_id: Option<TaskId>,
    pub title: String,
    pub description: String,
    /// Epoch milliseconds; `None` is saved as "now".
    pub due_date: Option<i64>,
    pub is_task_complete: bool,
    pub priority: Priority,
    pub related_to_subject: Option<String>,
    pub subject_id: Option<SubjectId>,
    /// Choices for the related-subject picker.
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    TitleChanged(String),
    DescriptionChanged(String),
    DueDateChanged(Option<i64>),
    PriorityChanged(Priority),
    RelatedSubjectSelected(Subject),
    CompletionToggled,
    SaveTask,
    DeleteTask,
}

pub struct TaskController {
    subjects: Arc<dyn SubjectRepository>,
    tasks: Arc<dyn TaskRepository>,
    form: Arc<watch::Sender<TaskState>>,
    state: SharedState<TaskState>,
    events: UiEventBus,
    scope: ControllerScope,
}

impl TaskController {
    /// `task_id` selects an existing task to edit; `subject_id` preselects
    /// the related subject. Must be called inside a Tokio runtime.
    pub fn new(
        task_id: Option<TaskId>,
        subject_id: Option<SubjectId>,
        subjects: Arc<dyn SubjectRepository>,
        tasks: Arc<dyn TaskRepository>,
        settings: ControllerSettings,
    ) -> Self {
        let (form, _) = watch::channel(TaskState::default());
        let form = Arc::new(form);

        let all_subjects = subjects.all_subjects();
        let upstream_form = Arc::clone(&form);
        let state = SharedState::launch(
            TaskState::default(),
            settings.stop_timeout,
            move |publisher| combine(publisher, upstream_form.subscribe(), all_subjects.clone()),
        );

        let controller = Self {
            subjects,
            tasks,
            form,
            state,
            events: UiEventBus::new(settings.event_buffer),
            scope: ControllerScope::new(),
        };
        if let Some(task_id) = task_id {
            controller.fetch_task(task_id);
        }
        if let Some(subject_id) = subject_id {
            controller.fetch_subject(subject_id);
        }
        controller
    }

    pub fn state(&self) -> StateSubscription<TaskState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> TaskState {
        self.state.value()
    }

    pub fn events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn on_event(&self, event: TaskEvent) {
        match event {
            TaskEvent::TitleChanged(title) => self.form.send_modify(|form| form.title = title),
            TaskEvent::DescriptionChanged(description) => {
                self.form.send_modify(|form| form.description = description);
            }
            TaskEvent::DueDateChanged(due_date) => {
                self.form.send_modify(|form| form.due_date = due_date);
            }
            TaskEvent::PriorityChanged(priority) => {
                self.form.send_modify(|form| form.priority = priority);
            }
            TaskEvent::RelatedSubjectSelected(subject) => self.form.send_modify(|form| {
                form.related_to_subject = Some(subject.name);
                form.subject_id = subject.subject_id;
            }),
            TaskEvent::CompletionToggled => {
                self.form
                    .send_modify(|form| form.is_task_complete = !form.is_task_complete);
            }
            TaskEvent::SaveTask => self.save_task(),
            TaskEvent::DeleteTask => self.delete_task(),
        }
    }

    fn fetch_task(&self, task_id: TaskId) {
        let lookup = self.tasks.get_task_by_id(task_id);
        let form = Arc::clone(&self.form);
        self.scope.launch(async move {
            match offload(move || lookup.current()).await {
                Ok(Some(task)) => form.send_modify(|form| {
                    form.current_task_id = task.task_id;
                    form.title = task.title;
                    form.description = task.description;
                    form.due_date = task.due_date;
                    form.is_task_complete = task.is_complete;
                    form.related_to_subject = Some(task.related_to_subject);
                    form.priority = task.priority;
                    form.subject_id = task.task_subject_id;
                }),
                Ok(None) => {}
                Err(err) => warn!(
                    "event=task_load module=presentation status=error task_id={task_id} error={err}"
                ),
            }
        });
    }

    fn fetch_subject(&self, subject_id: SubjectId) {
        let lookup = self.subjects.get_subject_by_id(subject_id);
        let form = Arc::clone(&self.form);
        self.scope.launch(async move {
            match offload(move || lookup.current()).await {
                Ok(Some(subject)) => form.send_modify(|form| {
                    form.subject_id = subject.subject_id;
                    form.related_to_subject = Some(subject.name);
                }),
                Ok(None) => {}
                Err(err) => warn!(
                    "event=subject_load module=presentation status=error subject_id={subject_id} error={err}"
                ),
            }
        });
    }

    fn save_task(&self) {
        let form = self.form.borrow().clone();
        let (Some(subject_id), Some(related_to_subject)) = (form.subject_id, form.related_to_subject)
        else {
            self.events.emit(UiEvent::snackbar_long(
                "Please select subject related to the task",
            ));
            return;
        };
        let task = Task {
            task_id: form.current_task_id,
            title: form.title,
            description: form.description,
            due_date: Some(form.due_date.unwrap_or_else(now_epoch_ms)),
            priority: form.priority,
            related_to_subject,
            is_complete: form.is_task_complete,
            task_subject_id: Some(subject_id),
        };
        let tasks = Arc::clone(&self.tasks);
        let events = self.events.clone();

        self.scope.launch(async move {
            let result = offload(move || tasks.upsert_task(&task)).await;
            log_write("save_task", &result);
            match result {
                Ok(_) => {
                    events.emit(UiEvent::snackbar("Save task successfully"));
                    events.emit(UiEvent::NavigateUp);
                }
                Err(err) => events.emit(write_failed("Couldn't save task.", &err)),
            }
        });
    }

    fn delete_task(&self) {
        let current = self.form.borrow().current_task_id;
        let Some(task_id) = current else {
            self.events.emit(UiEvent::snackbar("No task to delete."));
            return;
        };
        let tasks = Arc::clone(&self.tasks);
        let events = self.events.clone();

        self.scope.launch(async move {
            let result = offload(move || tasks.delete_task(task_id)).await;
            log_write("delete_task", &result);
            match result {
                Ok(()) => {
                    events.emit(UiEvent::snackbar("Task deleted successfully."));
                    events.emit(UiEvent::NavigateUp);
                }
                Err(err) => events.emit(write_failed("Couldn't delete task.", &err)),
            }
        });
    }
}

async fn combine(
    publisher: StatePublisher<TaskState>,
    mut form: watch::Receiver<TaskState>,
    all_subjects: Observable<Vec<Subject>>,
) {
    let mut subjects = all_subjects.subscribe();

    loop {
        if let Some(subject_list) = subjects.latest() {
            publisher.publish(TaskState {
                subjects: subject_list,
                ..form.borrow().clone()
            });
        }

        let alive = tokio::select! {
            changed = form.changed() => changed.is_ok(),
            alive = subjects.changed() => alive,
        };
        if !alive {
            break;
        }
    }
}
