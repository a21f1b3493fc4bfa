//! Subject domain model.
//!
//! # Invariants
//! - `subject_id` is `None` until the record has been inserted.
//! - `goal_hours` is finite and non-negative.
//! - `colors` keeps the caller's order; it is rendered as a gradient.

use crate::model::ModelValidationError;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Store-assigned subject identity.
pub type SubjectId = i64;

const fn argb(value: u32) -> i32 {
    value as i32
}

/// Two-stop gradients offered for subject cards.
pub const SUBJECT_CARD_COLORS: [[i32; 2]; 5] = [
    [argb(0xFF7F00FF), argb(0xFFE100FF)],
    [argb(0xFF2193B0), argb(0xFF6DD5ED)],
    [argb(0xFFF7971E), argb(0xFFFFD200)],
    [argb(0xFF11998E), argb(0xFF38EF7D)],
    [argb(0xFFEB3349), argb(0xFFF45C43)],
];

/// Picks one palette gradient at random.
pub fn random_card_colors() -> Vec<i32> {
    SUBJECT_CARD_COLORS
        .choose(&mut rand::thread_rng())
        .unwrap_or(&SUBJECT_CARD_COLORS[0])
        .to_vec()
}

/// A user-defined study topic with a goal in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: Option<SubjectId>,
    pub name: String,
    pub goal_hours: f32,
    /// ARGB colors, first to last gradient stop.
    pub colors: Vec<i32>,
}

impl Subject {
    /// Creates a not-yet-persisted subject.
    pub fn new(name: impl Into<String>, goal_hours: f32, colors: Vec<i32>) -> Self {
        Self {
            subject_id: None,
            name: name.into(),
            goal_hours,
            colors,
        }
    }

    /// Same record bound to an existing id.
    pub fn with_id(mut self, subject_id: SubjectId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if !self.goal_hours.is_finite() {
            return Err(ModelValidationError::NonFiniteGoalHours);
        }
        if self.goal_hours < 0.0 {
            return Err(ModelValidationError::NegativeGoalHours(self.goal_hours));
        }
        Ok(())
    }
}
