//! Task ownership for controllers.

use crate::repo::{RepoError, RepoResult};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::{JoinHandle, JoinSet};

/// Aborts the wrapped task when dropped.
pub(crate) struct TaskGuard(JoinHandle<()>);

impl TaskGuard {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self(tokio::spawn(future))
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Background tasks launched on behalf of one controller.
///
/// Dropping the scope aborts every task still running, mirroring a screen
/// being destroyed.
pub struct ControllerScope {
    runtime: Handle,
    tasks: Mutex<JoinSet<()>>,
}

impl ControllerScope {
    /// Binds the scope to the runtime it is created in.
    ///
    /// # Panics
    /// Outside a Tokio runtime.
    pub fn new() -> Self {
        Self {
            runtime: Handle::current(),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Spawns `future` on the scope's runtime. Callable from any thread.
    pub fn launch<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        tasks.spawn_on(future, &self.runtime);
    }
}

/// Runs a blocking repository call off the async executor.
pub async fn offload<T, F>(work: F) -> RepoResult<T>
where
    F: FnOnce() -> RepoResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| RepoError::Worker(err.to_string()))?
}
