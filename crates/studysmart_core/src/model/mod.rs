//! Domain model for subjects, tasks and study sessions.
//!
//! # Responsibility
//! - Define canonical data structures used by repositories and controllers.
//! - Own value-level invariants (`validate()`) and pure derivations such as
//!   task ordering and progress.
//!
//! # Invariants
//! - Goal hours and session durations are never negative.
//! - Upcoming/completed task lists are ordered by `due_date ASC, priority DESC`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod color_list;
pub mod progress;
pub mod session;
pub mod subject;
pub mod task;

/// Value-level validation failures for domain records.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValidationError {
    /// `Subject::goal_hours` is below zero.
    NegativeGoalHours(f32),
    /// `Subject::goal_hours` is NaN or infinite.
    NonFiniteGoalHours,
    /// `Session::duration` is below zero.
    NegativeDuration(i64),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeGoalHours(value) => {
                write!(f, "goal hours must not be negative, got {value}")
            }
            Self::NonFiniteGoalHours => write!(f, "goal hours must be a finite number"),
            Self::NegativeDuration(value) => {
                write!(f, "session duration must not be negative, got {value}")
            }
        }
    }
}

impl Error for ModelValidationError {}
