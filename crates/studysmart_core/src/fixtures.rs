//! Sample records for previews, demos and tests.
//!
//! Every call returns fresh values; nothing here is shared state.

use crate::model::session::Session;
use crate::model::subject::{Subject, SubjectId, SUBJECT_CARD_COLORS};
use crate::model::task::{Priority, Task};
use crate::repo::session_repo::SessionRepository;
use crate::repo::subject_repo::SubjectRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use std::collections::HashMap;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
// 2024-01-01T00:00:00Z
const BASE_DATE_MS: i64 = 1_704_067_200_000;

/// Five subjects with ids `1..=5`, one per palette gradient.
pub fn sample_subjects() -> Vec<Subject> {
    [
        ("English", 10.0),
        ("Physics", 10.0),
        ("Maths", 12.0),
        ("Geology", 8.0),
        ("Fine Arts", 6.5),
    ]
    .into_iter()
    .zip(SUBJECT_CARD_COLORS)
    .zip(1..)
    .map(|(((name, goal), colors), id)| Subject::new(name, goal, colors.to_vec()).with_id(id))
    .collect()
}

/// Tasks spread over the sample subjects, some completed.
pub fn sample_tasks() -> Vec<Task> {
    let task = |id: i64, title: &str, subject: (SubjectId, &str), due_day: i64, priority, done| Task {
        task_id: Some(id),
        title: title.to_string(),
        description: String::new(),
        due_date: Some(BASE_DATE_MS + due_day * DAY_MS),
        priority,
        related_to_subject: subject.1.to_string(),
        is_complete: done,
        task_subject_id: Some(subject.0),
    };
    vec![
        task(1, "Prepare notes", (1, "English"), 2, Priority::Low, false),
        task(2, "Do homework", (2, "Physics"), 1, Priority::Medium, true),
        task(3, "Go coaching", (2, "Physics"), 3, Priority::High, false),
        task(4, "Assignment", (3, "Maths"), 3, Priority::Low, false),
        task(5, "Write poem", (5, "Fine Arts"), 5, Priority::High, true),
    ]
}

/// Sessions for the sample subjects, newest last.
pub fn sample_sessions() -> Vec<Session> {
    [
        (1, "English", 0, 3_600),
        (2, "Physics", 1, 5_400),
        (3, "Maths", 2, 1_800),
        (2, "Physics", 3, 2_700),
        (4, "Geology", 4, 900),
    ]
    .into_iter()
    .zip(1..)
    .map(|((subject_id, name, day, duration), id)| Session {
        session_id: Some(id),
        ..Session::new(subject_id, name, BASE_DATE_MS + day * DAY_MS, duration)
    })
    .collect()
}

/// Writes the sample records into the given repositories.
///
/// Subjects receive fresh ids from the store; tasks and sessions are
/// rebound to them.
pub fn seed_sample_data(
    subjects: &dyn SubjectRepository,
    tasks: &dyn TaskRepository,
    sessions: &dyn SessionRepository,
) -> RepoResult<()> {
    let mut assigned: HashMap<SubjectId, SubjectId> = HashMap::new();
    for subject in sample_subjects() {
        let fixture_id = subject.subject_id;
        let stored_id = subjects.upsert_subject(&Subject {
            subject_id: None,
            ..subject
        })?;
        if let Some(fixture_id) = fixture_id {
            assigned.insert(fixture_id, stored_id);
        }
    }

    for task in sample_tasks() {
        tasks.upsert_task(&Task {
            task_id: None,
            task_subject_id: task
                .task_subject_id
                .and_then(|id| assigned.get(&id).copied()),
            ..task
        })?;
    }
    for session in sample_sessions() {
        let Some(&subject_id) = assigned.get(&session.session_subject_id) else {
            continue;
        };
        sessions.insert_session(&Session {
            session_id: None,
            session_subject_id: subject_id,
            ..session
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{sample_sessions, sample_subjects, sample_tasks};

    #[test]
    fn fixtures_reference_sample_subjects() {
        let subjects = sample_subjects();
        let known = |id| subjects.iter().any(|subject| subject.subject_id == Some(id));
        assert!(sample_tasks()
            .iter()
            .all(|task| task.task_subject_id.is_some_and(known)));
        assert!(sample_sessions()
            .iter()
            .all(|session| known(session.session_subject_id)));
    }

    #[test]
    fn fixtures_are_valid_and_fresh() {
        for subject in sample_subjects() {
            subject.validate().unwrap();
        }
        for session in sample_sessions() {
            session.validate().unwrap();
        }
        let mut first = sample_subjects();
        first[0].name.push('!');
        assert_eq!(sample_subjects()[0].name, "English");
    }
}
