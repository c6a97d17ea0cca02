//! Recurring task lineages.
//!
//! Completing an instance of a recurring task spawns the next instance of its
//! series, one period later. Un-completing never retracts a spawned instance,
//! and completing again does not spawn a second one for the same due date.

use std::cmp::Ordering;
use std::collections::HashMap;

use uuid::Uuid;

use crate::task::ToDoTask;

/// Result of changing a task's completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Toggled {
    pub task: ToDoTask,
    /// The next instance of the series, if this change spawned one.
    pub spawned: Option<ToDoTask>,
}

/// Flip `task`'s completion, spawning the next instance when it becomes
/// completed.
pub fn toggle_completion(task: &ToDoTask, all_tasks: &[ToDoTask]) -> Toggled {
    set_completion(task, !task.is_completed, all_tasks)
}

/// Set `task`'s completion. Only a false to true transition can spawn.
pub fn set_completion(task: &ToDoTask, completed: bool, all_tasks: &[ToDoTask]) -> Toggled {
    let mut updated = task.clone();
    updated.is_completed = completed;

    if !completed || task.is_completed {
        return Toggled {
            task: updated,
            spawned: None,
        };
    }

    if updated.is_recurring() && updated.series_id.is_none() {
        updated.series_id = Some(updated.id.clone());
    }

    let spawned = next_instance(&updated).filter(|next| !already_spawned(next, all_tasks));

    Toggled {
        task: updated,
        spawned,
    }
}

/// The instance that follows `task` in its series, or `None` if the task does
/// not recur, has no due date, or the next due date is past `until`.
pub fn next_instance(task: &ToDoTask) -> Option<ToDoTask> {
    let spec = task.recurrence?;
    let due = task.due_date?;
    let next_due = spec.rule.advance(due)?;

    if !spec.allows(next_due) {
        tracing::info!(task = %task.id, series = task.series_key(), "series ended");
        return None;
    }

    Some(ToDoTask {
        id: Uuid::new_v4().to_string(),
        series_id: Some(task.series_key().to_string()),
        due_date: Some(next_due),
        is_completed: false,
        ..task.clone()
    })
}

fn already_spawned(next: &ToDoTask, all_tasks: &[ToDoTask]) -> bool {
    all_tasks
        .iter()
        .any(|t| t.series_key() == next.series_key() && t.due_date == next.due_date)
}

/// Collapse each series to one representative card, keeping input order.
///
/// `tasks` is expected to be sorted already. The representative of a series
/// is its first incomplete task; when every instance is complete, the one
/// with the latest due date. Tasks without a series pass through.
pub fn representatives(tasks: &[ToDoTask]) -> Vec<ToDoTask> {
    let mut chosen: HashMap<&str, usize> = HashMap::new();

    for (idx, task) in tasks.iter().enumerate() {
        let Some(series) = task.series_id.as_deref() else {
            continue;
        };

        match chosen.get(series) {
            None => {
                chosen.insert(series, idx);
            }
            Some(&current) => {
                let current = &tasks[current];
                let replace = if current.is_completed && !task.is_completed {
                    true
                } else if current.is_completed && task.is_completed {
                    cmp_due_undated_first(&task.due_date, &current.due_date) != Ordering::Less
                } else {
                    false
                };
                if replace {
                    chosen.insert(series, idx);
                }
            }
        }
    }

    tasks
        .iter()
        .enumerate()
        .filter(|(idx, task)| match task.series_id.as_deref() {
            Some(series) => chosen.get(series) == Some(idx),
            None => true,
        })
        .map(|(_, task)| task.clone())
        .collect()
}

/// Every instance of `series_id`, newest due date first, undated last.
pub fn history(all_tasks: &[ToDoTask], series_id: &str) -> Vec<ToDoTask> {
    let mut lineage: Vec<ToDoTask> = all_tasks
        .iter()
        .filter(|t| t.series_id.as_deref() == Some(series_id))
        .cloned()
        .collect();

    lineage.sort_by(|a, b| cmp_due_undated_first(&b.due_date, &a.due_date));
    lineage
}

fn cmp_due_undated_first<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{RecurrenceRule, RecurrenceSpec};
    use crate::task::TaskCategory;
    use crate::time::Instant;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> Instant {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn make_task(id: &str, due: Option<Instant>, rule: Option<RecurrenceRule>) -> ToDoTask {
        ToDoTask {
            id: id.to_string(),
            series_id: rule.map(|_| id.to_string()),
            title: "Take out Trash".to_string(),
            category: TaskCategory::Chores,
            assignee_ids: vec!["m3".to_string()],
            due_date: due,
            is_completed: false,
            recurrence: rule.map(|r| RecurrenceSpec::new(r, None)),
        }
    }

    #[test]
    fn non_recurring_toggle_only_flips() {
        let task = make_task("t1", Some(day(2025, 3, 1)), None);
        let toggled = toggle_completion(&task, &[task.clone()]);
        assert!(toggled.task.is_completed);
        assert!(toggled.spawned.is_none());

        let back = toggle_completion(&toggled.task, &[toggled.task.clone()]);
        assert!(!back.task.is_completed);
    }

    #[test]
    fn completing_recurring_spawns_next() {
        let task = make_task("t2", Some(day(2025, 3, 1)), Some(RecurrenceRule::Weekly));
        let toggled = toggle_completion(&task, &[task.clone()]);
        let next = toggled.spawned.unwrap();
        assert_ne!(next.id, task.id);
        assert_eq!(next.series_id.as_deref(), Some("t2"));
        assert_eq!(next.due_date, Some(day(2025, 3, 8)));
        assert!(!next.is_completed);
        assert_eq!(next.title, task.title);
        assert_eq!(next.assignee_ids, task.assignee_ids);
        assert_eq!(next.recurrence, task.recurrence);
    }

    #[test]
    fn monthly_from_jan_31_lands_on_feb_28() {
        let task = make_task("t3", Some(day(2025, 1, 31)), Some(RecurrenceRule::Monthly));
        let next = toggle_completion(&task, &[task.clone()]).spawned.unwrap();
        assert_eq!(next.due_date, Some(day(2025, 2, 28)));
    }

    #[test]
    fn legacy_recurring_task_without_series_gets_one() {
        let mut task = make_task("t4", Some(day(2025, 3, 1)), Some(RecurrenceRule::Daily));
        task.series_id = None;
        let toggled = toggle_completion(&task, &[task.clone()]);
        assert_eq!(toggled.task.series_id.as_deref(), Some("t4"));
        assert_eq!(toggled.spawned.unwrap().series_id.as_deref(), Some("t4"));
    }

    #[test]
    fn recurring_without_due_date_does_not_spawn() {
        let task = make_task("t5", None, Some(RecurrenceRule::Daily));
        assert!(toggle_completion(&task, &[task.clone()]).spawned.is_none());
    }

    #[test]
    fn completing_an_already_completed_task_does_not_spawn() {
        let mut task = make_task("t6", Some(day(2025, 3, 1)), Some(RecurrenceRule::Daily));
        task.is_completed = true;
        assert!(set_completion(&task, true, &[task.clone()]).spawned.is_none());
    }

    #[test]
    fn recompleting_does_not_duplicate() {
        let task = make_task("t7", Some(day(2025, 3, 1)), Some(RecurrenceRule::Weekly));
        let first = toggle_completion(&task, &[task.clone()]);
        let next = first.spawned.clone().unwrap();
        let all = vec![first.task.clone(), next];

        let undone = toggle_completion(&first.task, &all);
        assert!(undone.spawned.is_none());
        let all = vec![undone.task.clone(), all[1].clone()];

        let redone = toggle_completion(&undone.task, &all);
        assert!(redone.task.is_completed);
        assert!(redone.spawned.is_none());
    }

    #[test]
    fn representatives_prefer_earliest_incomplete() {
        let mut a = make_task("a", Some(day(2025, 3, 1)), Some(RecurrenceRule::Weekly));
        a.is_completed = true;
        let mut b = make_task("b", Some(day(2025, 3, 8)), Some(RecurrenceRule::Weekly));
        b.series_id = Some("a".to_string());
        let mut c = make_task("c", Some(day(2025, 3, 15)), Some(RecurrenceRule::Weekly));
        c.series_id = Some("a".to_string());
        let solo = make_task("solo", None, None);

        // sorted: incomplete first by date, completed last
        let sorted = vec![b.clone(), c.clone(), solo.clone(), a.clone()];
        let reps = representatives(&sorted);
        let ids: Vec<_> = reps.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "solo"]);
    }

    #[test]
    fn representatives_fall_back_to_latest_completed() {
        let mut a = make_task("a", Some(day(2025, 3, 1)), Some(RecurrenceRule::Weekly));
        a.is_completed = true;
        let mut b = make_task("b", Some(day(2025, 3, 8)), Some(RecurrenceRule::Weekly));
        b.series_id = Some("a".to_string());
        b.is_completed = true;

        let reps = representatives(&[a, b]);
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].id, "b");
    }

    #[test]
    fn history_is_newest_first() {
        let a = make_task("a", Some(day(2025, 3, 1)), Some(RecurrenceRule::Weekly));
        let mut b = make_task("b", Some(day(2025, 3, 8)), Some(RecurrenceRule::Weekly));
        b.series_id = Some("a".to_string());
        let mut undated = make_task("u", None, Some(RecurrenceRule::Weekly));
        undated.series_id = Some("a".to_string());
        let other = make_task("x", Some(day(2025, 3, 9)), Some(RecurrenceRule::Weekly));

        let hist = history(&[a, undated, other, b], "a");
        let ids: Vec<_> = hist.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "u"]);
    }
}
