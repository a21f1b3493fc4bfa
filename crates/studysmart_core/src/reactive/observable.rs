//! Live queries over the shared store.
//!
//! An `Observable` is cold: nothing runs until `subscribe()`. Every
//! subscription gets its own driver task that queries once, then again after
//! each store invalidation, and publishes into a `watch` channel. Equal
//! consecutive results are not re-published.

use super::TaskGuard;
use crate::db::Database;
use crate::repo::RepoResult;
use log::{error, warn};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::watch;

type QueryFn<T> = Arc<dyn Fn(&Connection) -> RepoResult<T> + Send + Sync>;

enum Source<T> {
    Query { db: Arc<Database>, run: QueryFn<T> },
    Constant(T),
}

/// Observable collection or aggregate.
pub struct Observable<T> {
    label: &'static str,
    source: Source<T>,
}

impl<T: Clone> Clone for Observable<T> {
    fn clone(&self) -> Self {
        let source = match &self.source {
            Source::Query { db, run } => Source::Query {
                db: Arc::clone(db),
                run: Arc::clone(run),
            },
            Source::Constant(value) => Source::Constant(value.clone()),
        };
        Self {
            label: self.label,
            source,
        }
    }
}

impl<T> Observable<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Live query re-run after every committed write.
    pub fn query(
        db: Arc<Database>,
        label: &'static str,
        run: impl Fn(&Connection) -> RepoResult<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label,
            source: Source::Query {
                db,
                run: Arc::new(run),
            },
        }
    }

    /// Fixed value; used by fixtures and preview harnesses.
    pub fn constant(value: T) -> Self {
        Self {
            label: "constant",
            source: Source::Constant(value),
        }
    }

    /// Derives a new observable by transforming every emitted value.
    pub fn map<U>(self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Observable<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
    {
        let source = match self.source {
            Source::Query { db, run } => Source::Query {
                db,
                run: Arc::new(move |conn: &Connection| run(conn).map(&f)),
            },
            Source::Constant(value) => Source::Constant(f(value)),
        };
        Observable {
            label: self.label,
            source,
        }
    }

    /// Evaluates the query once, synchronously.
    pub fn current(&self) -> RepoResult<T> {
        match &self.source {
            Source::Query { db, run } => db.read(|conn| run(conn)),
            Source::Constant(value) => Ok(value.clone()),
        }
    }

    /// Starts observing. Must be called inside a Tokio runtime.
    pub fn subscribe(&self) -> LiveQuery<T> {
        match &self.source {
            Source::Query { db, run } => {
                let (tx, rx) = watch::channel(None);
                let driver = TaskGuard::spawn(drive(
                    Arc::clone(db),
                    self.label,
                    Arc::clone(run),
                    tx,
                ));
                LiveQuery {
                    rx,
                    _driver: Some(driver),
                    _constant: None,
                }
            }
            Source::Constant(value) => {
                let (tx, rx) = watch::channel(Some(value.clone()));
                LiveQuery {
                    rx,
                    _driver: None,
                    _constant: Some(tx),
                }
            }
        }
    }
}

/// One active subscription to an `Observable`.
pub struct LiveQuery<T> {
    rx: watch::Receiver<Option<T>>,
    _driver: Option<TaskGuard>,
    // keeps constant channels open
    _constant: Option<watch::Sender<Option<T>>>,
}

impl<T: Clone> LiveQuery<T> {
    /// Latest emitted value; `None` until the first query completes.
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Waits for the next emission. Returns `false` if the source ended.
    ///
    /// Cancel-safe.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

async fn drive<T>(
    db: Arc<Database>,
    label: &'static str,
    run: QueryFn<T>,
    tx: watch::Sender<Option<T>>,
) where
    T: PartialEq + Send + Sync + 'static,
{
    let mut invalidations = db.invalidations();
    invalidations.borrow_and_update();

    loop {
        let query_db = Arc::clone(&db);
        let query = Arc::clone(&run);
        match tokio::task::spawn_blocking(move || query_db.read(|conn| query(conn))).await {
            Ok(Ok(value)) => {
                tx.send_if_modified(|current| {
                    if current.as_ref() == Some(&value) {
                        false
                    } else {
                        *current = Some(value);
                        true
                    }
                });
            }
            Ok(Err(err)) => {
                warn!("event=live_query module=reactive status=error query={label} error={err}");
            }
            Err(err) => {
                error!(
                    "event=live_query module=reactive status=error query={label} error_code=worker_failed error={err}"
                );
            }
        }

        tokio::select! {
            changed = invalidations.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            () = tx.closed() => break,
        }
    }
}
