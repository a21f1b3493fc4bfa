//! Hot, cached state shared by every observer of a controller.
//!
//! # Invariants
//! - The upstream runs only while at least one `StateSubscription` exists,
//!   or for `stop_timeout` after the last one is dropped.
//! - A subscription arriving inside the timeout keeps the same upstream.
//! - The last published value survives upstream restarts.

use super::TaskGuard;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Write side handed to the upstream combiner.
pub struct StatePublisher<S> {
    value: Arc<watch::Sender<S>>,
}

impl<S: PartialEq> StatePublisher<S> {
    /// Replaces the shared value; equal values are not re-announced.
    pub fn publish(&self, next: S) {
        self.value.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Shared state with start-on-first-subscriber semantics.
pub struct SharedState<S> {
    value: Arc<watch::Sender<S>>,
    subscribers: Arc<watch::Sender<usize>>,
    _supervisor: TaskGuard,
}

impl<S> SharedState<S>
where
    S: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates the state and its supervisor. Must be called inside a Tokio
    /// runtime.
    ///
    /// `upstream` is invoked each time observation (re)starts; the returned
    /// future is dropped when observation stops.
    pub fn launch<F, Fut>(initial: S, stop_timeout: Duration, upstream: F) -> Self
    where
        F: Fn(StatePublisher<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (value, _) = watch::channel(initial);
        let value = Arc::new(value);
        let (subscribers, subscriber_count) = watch::channel(0_usize);

        let publisher_value = Arc::clone(&value);
        let supervisor = TaskGuard::spawn(supervise(subscriber_count, stop_timeout, move || {
            upstream(StatePublisher {
                value: Arc::clone(&publisher_value),
            })
        }));

        Self {
            value,
            subscribers: Arc::new(subscribers),
            _supervisor: supervisor,
        }
    }

    /// Latest cached value, without subscribing.
    pub fn value(&self) -> S {
        self.value.borrow().clone()
    }

    /// Attaches an observer; starts the upstream if it is not running.
    pub fn subscribe(&self) -> StateSubscription<S> {
        let rx = self.value.subscribe();
        self.subscribers.send_modify(|count| *count += 1);
        StateSubscription {
            rx,
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        *self.subscribers.borrow()
    }
}

/// Observer handle; dropping it detaches.
pub struct StateSubscription<S> {
    rx: watch::Receiver<S>,
    subscribers: Arc<watch::Sender<usize>>,
}

impl<S: Clone> StateSubscription<S> {
    pub fn current(&self) -> S {
        self.rx.borrow().clone()
    }

    /// Waits for the next published value. Returns `false` once the state
    /// owner is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits until a published value satisfies `predicate` and returns it.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&S) -> bool) -> Option<S> {
        self.rx
            .wait_for(|state| predicate(state))
            .await
            .ok()
            .map(|state| S::clone(&state))
    }
}

impl<S> Drop for StateSubscription<S> {
    fn drop(&mut self) {
        self.subscribers
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

async fn supervise<F, Fut>(
    mut subscriber_count: watch::Receiver<usize>,
    stop_timeout: Duration,
    start: F,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        if subscriber_count.wait_for(|count| *count > 0).await.is_err() {
            return;
        }
        let upstream = TaskGuard::spawn(start());

        loop {
            if subscriber_count.wait_for(|count| *count == 0).await.is_err() {
                return;
            }
            let resubscribed = tokio::select! {
                () = tokio::time::sleep(stop_timeout) => false,
                result = subscriber_count.wait_for(|count| *count > 0) => {
                    if result.is_err() {
                        return;
                    }
                    true
                }
            };
            if !resubscribed {
                break;
            }
        }

        drop(upstream);
    }
}
