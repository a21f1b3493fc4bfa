//! One-shot UI notifications.
//!
//! Backed by a `broadcast` channel: events are delivered only to receivers
//! that exist at send time, and nothing is replayed to late subscribers.

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// How long a snackbar stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnackbarDuration {
    Short,
    Long,
}

/// Fire-and-forget signal for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiEvent {
    ShowSnackbar {
        message: String,
        duration: SnackbarDuration,
    },
    NavigateUp,
}

impl UiEvent {
    pub fn snackbar(message: impl Into<String>) -> Self {
        Self::ShowSnackbar {
            message: message.into(),
            duration: SnackbarDuration::Short,
        }
    }

    pub fn snackbar_long(message: impl Into<String>) -> Self {
        Self::ShowSnackbar {
            message: message.into(),
            duration: SnackbarDuration::Long,
        }
    }

    /// Snackbar text, if this is a snackbar.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::ShowSnackbar { message, .. } => Some(message.as_str()),
            Self::NavigateUp => None,
        }
    }
}

/// Broadcast bus for `UiEvent`s.
#[derive(Debug, Clone)]
pub struct UiEventBus {
    tx: broadcast::Sender<UiEvent>,
}

impl UiEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Sends to current subscribers; dropped silently when nobody listens.
    pub fn emit(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            debug!("event=ui_event module=reactive status=dropped reason=no_subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }
}
