//! Task domain model and list ordering.
//!
//! # Invariants
//! - A scope's task set is split by `is_complete` into upcoming/completed.
//! - Each partition is ordered by `due_date ASC`, then `priority DESC`.
//!   An unset due date sorts first. The sort is stable.

use crate::model::subject::SubjectId;
use serde::{Deserialize, Serialize};

/// Store-assigned task identity.
pub type TaskId = i64;

/// Task urgency. Declaration order is the comparison order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Persisted integer value.
    pub fn value(self) -> i32 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Strict mapping used on persisted data.
    pub fn try_from_value(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|priority| priority.value() == value)
    }

    /// Lenient mapping for UI input; unknown values become `Medium`.
    pub fn from_value(value: i32) -> Self {
        Self::try_from_value(value).unwrap_or(Self::Medium)
    }
}

/// An actionable to-do item, optionally linked to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Option<TaskId>,
    pub title: String,
    pub description: String,
    /// Epoch milliseconds; `None` means unset.
    pub due_date: Option<i64>,
    pub priority: Priority,
    /// Denormalized subject name for list rendering.
    pub related_to_subject: String,
    pub is_complete: bool,
    pub task_subject_id: Option<SubjectId>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            task_id: None,
            title: title.into(),
            description: String::new(),
            due_date: None,
            priority: Priority::default(),
            related_to_subject: String::new(),
            is_complete: false,
            task_subject_id: None,
        }
    }

    /// Copy with the completion flag flipped.
    pub fn toggled(&self) -> Self {
        Self {
            is_complete: !self.is_complete,
            ..self.clone()
        }
    }
}

/// Upcoming and completed halves of one task scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPartition {
    pub upcoming: Vec<Task>,
    pub completed: Vec<Task>,
}

/// Sorts tasks by due date ascending, then priority descending.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| {
        left.due_date
            .cmp(&right.due_date)
            .then_with(|| right.priority.cmp(&left.priority))
    });
}

/// Splits a scope by completion flag and sorts both halves.
pub fn partition_tasks(tasks: Vec<Task>) -> TaskPartition {
    let (mut completed, mut upcoming): (Vec<Task>, Vec<Task>) =
        tasks.into_iter().partition(|task| task.is_complete);
    sort_tasks(&mut upcoming);
    sort_tasks(&mut completed);
    TaskPartition {
        upcoming,
        completed,
    }
}

#[cfg(test)]
mod tests {
    use super::{partition_tasks, sort_tasks, Priority, Task};

    fn task(title: &str, due: Option<i64>, priority: Priority, done: bool) -> Task {
        Task {
            due_date: due,
            priority,
            is_complete: done,
            ..Task::new(title)
        }
    }

    fn is_ordered(tasks: &[Task]) -> bool {
        tasks.windows(2).all(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            a.due_date < b.due_date || (a.due_date == b.due_date && a.priority >= b.priority)
        })
    }

    #[test]
    fn equal_due_dates_put_higher_priority_first() {
        let mut tasks = vec![
            task("low", Some(100), Priority::Low, false),
            task("high", Some(100), Priority::High, false),
        ];
        sort_tasks(&mut tasks);
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(tasks[1].priority, Priority::Low);
    }

    #[test]
    fn due_date_dominates_priority() {
        let mut tasks = vec![
            task("later-high", Some(200), Priority::High, false),
            task("sooner-low", Some(100), Priority::Low, false),
            task("unset", None, Priority::Medium, false),
        ];
        sort_tasks(&mut tasks);
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["unset", "sooner-low", "later-high"]);
    }

    #[test]
    fn sort_is_idempotent_and_ordered() {
        let mut tasks = Vec::new();
        for (index, due) in [5, 3, 3, 9, 1, 3, 5].into_iter().enumerate() {
            let priority = Priority::from_value((index % 3) as i32);
            tasks.push(task(&format!("t{index}"), Some(due), priority, false));
        }
        sort_tasks(&mut tasks);
        assert!(is_ordered(&tasks));

        let once = tasks.clone();
        sort_tasks(&mut tasks);
        assert_eq!(tasks, once);
    }

    #[test]
    fn sort_is_stable_for_full_ties() {
        let mut tasks = vec![
            task("first", Some(10), Priority::Medium, false),
            task("second", Some(10), Priority::Medium, false),
        ];
        sort_tasks(&mut tasks);
        assert_eq!(tasks[0].title, "first");
    }

    #[test]
    fn partition_splits_by_completion_and_sorts_each_half() {
        let partition = partition_tasks(vec![
            task("done-late", Some(50), Priority::Low, true),
            task("open-late", Some(40), Priority::Low, false),
            task("done-soon", Some(10), Priority::High, true),
            task("open-soon", Some(20), Priority::Medium, false),
        ]);

        let upcoming: Vec<_> = partition.upcoming.iter().map(|t| t.title.as_str()).collect();
        let completed: Vec<_> = partition.completed.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(upcoming, ["open-soon", "open-late"]);
        assert_eq!(completed, ["done-soon", "done-late"]);
    }

    #[test]
    fn priority_values_round_trip_and_fallback() {
        for priority in Priority::ALL {
            assert_eq!(Priority::try_from_value(priority.value()), Some(priority));
        }
        assert_eq!(Priority::try_from_value(9), None);
        assert_eq!(Priority::from_value(9), Priority::Medium);
        assert_eq!(Priority::High.title(), "High");
    }
}
