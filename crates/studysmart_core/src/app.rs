//! Wiring from store to repositories to controllers.

use crate::config::CoreConfig;
use crate::db::{Database, DbResult};
use crate::model::subject::SubjectId;
use crate::model::task::TaskId;
use crate::presentation::{
    ControllerSettings, DashboardController, SessionController, SubjectController, TaskController,
};
use crate::repo::session_repo::{SessionRepository, SqliteSessionRepository};
use crate::repo::subject_repo::{SqliteSubjectRepository, SubjectRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use std::sync::Arc;

/// Owns the store and hands out repositories and controllers.
pub struct AppContainer {
    db: Arc<Database>,
    subjects: Arc<dyn SubjectRepository>,
    tasks: Arc<dyn TaskRepository>,
    sessions: Arc<dyn SessionRepository>,
    settings: ControllerSettings,
}

impl AppContainer {
    /// Opens the database named by `config`.
    pub fn open(config: &CoreConfig) -> DbResult<Self> {
        let db = Database::open(&config.db_path)?;
        Ok(Self::from_database(Arc::new(db), config.controller_settings()))
    }

    /// Private in-memory store with default settings.
    pub fn in_memory() -> DbResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::from_database(Arc::new(db), ControllerSettings::default()))
    }

    pub fn from_database(db: Arc<Database>, settings: ControllerSettings) -> Self {
        Self {
            subjects: Arc::new(SqliteSubjectRepository::new(Arc::clone(&db))),
            tasks: Arc::new(SqliteTaskRepository::new(Arc::clone(&db))),
            sessions: Arc::new(SqliteSessionRepository::new(Arc::clone(&db))),
            db,
            settings,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn subjects(&self) -> Arc<dyn SubjectRepository> {
        Arc::clone(&self.subjects)
    }

    pub fn tasks(&self) -> Arc<dyn TaskRepository> {
        Arc::clone(&self.tasks)
    }

    pub fn sessions(&self) -> Arc<dyn SessionRepository> {
        Arc::clone(&self.sessions)
    }

    pub fn settings(&self) -> ControllerSettings {
        self.settings
    }

    /// Controllers spawn tasks, so these must run inside a Tokio runtime.
    pub fn dashboard(&self) -> DashboardController {
        DashboardController::new(self.subjects(), self.tasks(), self.sessions(), self.settings)
    }

    pub fn subject_detail(&self, subject_id: SubjectId) -> SubjectController {
        SubjectController::new(
            subject_id,
            self.subjects(),
            self.tasks(),
            self.sessions(),
            self.settings,
        )
    }

    pub fn task_detail(
        &self,
        task_id: Option<TaskId>,
        subject_id: Option<SubjectId>,
    ) -> TaskController {
        TaskController::new(task_id, subject_id, self.subjects(), self.tasks(), self.settings)
    }

    pub fn session(&self) -> SessionController {
        SessionController::new(self.subjects(), self.sessions(), self.settings)
    }
}
