use super::{
    NotificationChannel, NotificationSink, StatusNotification, TimerServiceError,
    ACTION_SERVICE_CANCEL, ACTION_SERVICE_START, ACTION_SERVICE_STOP,
};
use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Stop,
    Cancel,
}

impl TimerCommand {
    /// Parses a host intent action.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            ACTION_SERVICE_START => Some(Self::Start),
            ACTION_SERVICE_STOP => Some(Self::Stop),
            ACTION_SERVICE_CANCEL => Some(Self::Cancel),
            _ => None,
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            Self::Start => ACTION_SERVICE_START,
            Self::Stop => ACTION_SERVICE_STOP,
            Self::Cancel => ACTION_SERVICE_CANCEL,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimerServiceState {
    #[default]
    Idle,
    Foreground,
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Started,
    AlreadyRunning,
    /// Accepted without effect.
    Ignored,
}

/// Timer service skeleton. Only `Start` changes state; stop and cancel are
/// accepted and logged.
pub struct StudySessionTimerService<S> {
    sink: S,
    state: TimerServiceState,
}

impl<S: NotificationSink> StudySessionTimerService<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: TimerServiceState::Idle,
        }
    }

    pub fn state(&self) -> TimerServiceState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Dispatches a raw host action. Unknown actions are ignored.
    pub fn handle_action(&mut self, action: &str) -> Result<CommandOutcome, TimerServiceError> {
        match TimerCommand::from_action(action) {
            Some(command) => self.handle(command),
            None => {
                warn!("event=timer_command module=timer status=ignored reason=unknown_action");
                Ok(CommandOutcome::Ignored)
            }
        }
    }

    pub fn handle(&mut self, command: TimerCommand) -> Result<CommandOutcome, TimerServiceError> {
        let action = command.action();
        info!("event=timer_command module=timer status=start action={action}");

        let result = match command {
            TimerCommand::Start => self.start_foreground(),
            TimerCommand::Stop | TimerCommand::Cancel => Ok(CommandOutcome::Ignored),
        };

        match &result {
            Ok(outcome) => info!(
                "event=timer_command module=timer status=ok action={action} outcome={outcome:?}"
            ),
            Err(err) => {
                error!("event=timer_command module=timer status=error action={action} error={err}")
            }
        }
        result
    }

    fn start_foreground(&mut self) -> Result<CommandOutcome, TimerServiceError> {
        if self.state == TimerServiceState::Foreground {
            return Ok(CommandOutcome::AlreadyRunning);
        }
        self.sink.create_channel(&NotificationChannel::study_timer())?;
        self.sink
            .start_foreground(&StatusNotification::study_timer())?;
        self.state = TimerServiceState::Foreground;
        Ok(CommandOutcome::Started)
    }
}
