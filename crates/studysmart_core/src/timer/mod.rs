//! Foreground study-session timer service.
//!
//! # Responsibility
//! - Accept start/stop/cancel commands from the host.
//! - On start, register the notification channel and enter the foreground
//!   state with a persistent status notification.
//!
//! The host platform is reached only through [`NotificationSink`].

mod service;

pub use service::{CommandOutcome, StudySessionTimerService, TimerCommand, TimerServiceState};

use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NOTIFICATION_CHANNEL_ID: &str = "STUDY_SESSION_TIMER_CHANNEL";
pub const NOTIFICATION_CHANNEL_NAME: &str = "Study Session Timer";
pub const NOTIFICATION_ID: i32 = 10;
pub const NOTIFICATION_TITLE: &str = "Study session";
/// Elapsed time shown before the first tick.
pub const NOTIFICATION_INITIAL_TEXT: &str = "00:00:00";
/// Opened when the status notification is tapped.
pub const SESSION_DEEP_LINK: &str = "study_smart://dashboard/session";

pub const ACTION_SERVICE_START: &str = "ACTION_SERVICE_START";
pub const ACTION_SERVICE_STOP: &str = "ACTION_SERVICE_STOP";
pub const ACTION_SERVICE_CANCEL: &str = "ACTION_SERVICE_CANCEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelImportance {
    /// Shown without sound or heads-up.
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: ChannelImportance,
}

impl NotificationChannel {
    /// The single low-importance channel used by the timer.
    pub fn study_timer() -> Self {
        Self {
            id: NOTIFICATION_CHANNEL_ID.to_string(),
            name: NOTIFICATION_CHANNEL_NAME.to_string(),
            importance: ChannelImportance::Low,
        }
    }
}

/// Persistent notification posted while the timer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotification {
    pub id: i32,
    pub channel_id: String,
    pub title: String,
    pub text: String,
    /// Cannot be swiped away.
    pub ongoing: bool,
    pub deep_link: String,
}

impl StatusNotification {
    pub fn study_timer() -> Self {
        Self {
            id: NOTIFICATION_ID,
            channel_id: NOTIFICATION_CHANNEL_ID.to_string(),
            title: NOTIFICATION_TITLE.to_string(),
            text: NOTIFICATION_INITIAL_TEXT.to_string(),
            ongoing: true,
            deep_link: SESSION_DEEP_LINK.to_string(),
        }
    }
}

/// Host notification system.
pub trait NotificationSink {
    /// Registers a channel; re-registering the same id must be harmless.
    fn create_channel(&mut self, channel: &NotificationChannel) -> Result<(), TimerServiceError>;
    /// Promotes the service to the foreground with `notification` attached.
    fn start_foreground(&mut self, notification: &StatusNotification)
        -> Result<(), TimerServiceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerServiceError {
    /// The host rejected a notification request.
    Platform(String),
}

impl Display for TimerServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Platform(message) => write!(f, "notification platform error: {message}"),
        }
    }
}

impl Error for TimerServiceError {}
