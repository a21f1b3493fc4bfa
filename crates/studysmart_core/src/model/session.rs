//! Study session domain model.

use crate::model::subject::SubjectId;
use crate::model::ModelValidationError;
use serde::{Deserialize, Serialize};

/// Store-assigned session identity.
pub type SessionId = i64;

/// Shortest session, in seconds, that may be recorded.
pub const MIN_SESSION_DURATION_SECS: i64 = 36;

/// A completed, timed study interval linked to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Option<SessionId>,
    pub session_subject_id: SubjectId,
    /// Denormalized subject name, kept even if the subject is renamed.
    pub related_to_subject: String,
    /// Start time in epoch milliseconds.
    pub date: i64,
    /// Length in seconds.
    pub duration: i64,
}

impl Session {
    pub fn new(
        session_subject_id: SubjectId,
        related_to_subject: impl Into<String>,
        date: i64,
        duration: i64,
    ) -> Self {
        Self {
            session_id: None,
            session_subject_id,
            related_to_subject: related_to_subject.into(),
            date,
            duration,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.duration < 0 {
            return Err(ModelValidationError::NegativeDuration(self.duration));
        }
        Ok(())
    }
}

/// Whether a timer reading is long enough to be saved.
pub fn is_recordable_duration(duration_secs: i64) -> bool {
    duration_secs >= MIN_SESSION_DURATION_SECS
}

#[cfg(test)]
mod tests {
    use super::{is_recordable_duration, Session};

    #[test]
    fn duration_boundary_is_inclusive_at_36() {
        assert!(!is_recordable_duration(35));
        assert!(is_recordable_duration(36));
    }

    #[test]
    fn validate_rejects_negative_duration() {
        assert!(Session::new(1, "Physics", 0, -1).validate().is_err());
        assert!(Session::new(1, "Physics", 0, 0).validate().is_ok());
    }
}
