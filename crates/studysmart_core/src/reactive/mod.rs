//! Push-based observation primitives used between repositories and
//! controllers.
//!
//! # Responsibility
//! - `Observable`: cold live query that re-runs on store invalidation.
//! - `SharedState`: hot, cached combined state that runs its upstream only
//!   while someone is subscribed (plus a grace period).
//! - `ControllerScope`: owner of controller background tasks.
//! - `UiEventBus`: fire-and-forget one-shot notifications.
//!
//! # Invariants
//! - Dropping a subscription handle stops the work it started.
//! - No lock is held across an `.await`.

mod events;
mod observable;
mod scope;
mod shared;

pub use events::{SnackbarDuration, UiEvent, UiEventBus};
pub use observable::{LiveQuery, Observable};
pub use scope::{offload, ControllerScope};
pub use shared::{SharedState, StatePublisher, StateSubscription};

pub(crate) use scope::TaskGuard;
