//! Which events and tasks a view shows.

use std::cmp::Ordering;

use crate::date_range::DateRange;
use crate::event::CalendarEvent;
use crate::member::MemberId;
use crate::recurrence;
use crate::series;
use crate::task::{TaskCategory, ToDoTask};

/// Entities that reference household members.
pub trait MemberScoped {
    fn member_ids(&self) -> &[MemberId];

    fn involves(&self, member_id: &str) -> bool {
        self.member_ids().iter().any(|id| id == member_id)
    }
}

impl MemberScoped for CalendarEvent {
    fn member_ids(&self) -> &[MemberId] {
        &self.member_ids
    }
}

impl MemberScoped for ToDoTask {
    fn member_ids(&self) -> &[MemberId] {
        &self.assignee_ids
    }
}

/// Keep entities involving `member`; `None` keeps everything.
pub fn filter_by_member<T: MemberScoped + Clone>(items: &[T], member: Option<&str>) -> Vec<T> {
    match member {
        Some(id) => items.iter().filter(|i| i.involves(id)).cloned().collect(),
        None => items.to_vec(),
    }
}

/// Whether `task` shows up in a view covering `range`.
///
/// Backlog tasks (no due date) always show. Dated tasks show when due inside
/// the range, or when due before it and still incomplete.
pub fn is_task_visible(task: &ToDoTask, range: &DateRange) -> bool {
    match task.due_date {
        None => true,
        Some(due) if range.contains(due) => true,
        Some(due) => due < range.start && !task.is_completed,
    }
}

pub fn visible_tasks(tasks: &[ToDoTask], range: &DateRange) -> Vec<ToDoTask> {
    tasks
        .iter()
        .filter(|t| is_task_visible(t, range))
        .cloned()
        .collect()
}

/// Incomplete before completed; within each group by due date ascending,
/// undated last.
pub fn compare_tasks(a: &ToDoTask, b: &ToDoTask) -> Ordering {
    a.is_completed
        .cmp(&b.is_completed)
        .then_with(|| match (a.due_date, b.due_date) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(&b),
        })
}

pub fn sort_tasks(tasks: &mut [ToDoTask]) {
    tasks.sort_by(compare_tasks);
}

/// Expanded occurrences inside `range` involving `member`, ordered by start.
pub fn visible_events(
    events: &[CalendarEvent],
    range: &DateRange,
    member: Option<&str>,
) -> Vec<CalendarEvent> {
    let expanded = recurrence::expand_events(events, range);
    let mut visible = filter_by_member(&expanded, member);
    visible.sort_by(|a, b| a.start.cmp(&b.start));
    visible
}

/// The task list of a view: visibility, category tab, member filter, sort,
/// then one card per series.
pub fn task_list(
    tasks: &[ToDoTask],
    range: &DateRange,
    category: Option<TaskCategory>,
    member: Option<&str>,
) -> Vec<ToDoTask> {
    let mut list: Vec<ToDoTask> = visible_tasks(tasks, range)
        .into_iter()
        .filter(|t| category.is_none_or(|c| t.category == c))
        .collect();
    list = filter_by_member(&list, member);
    sort_tasks(&mut list);
    series::representatives(&list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{RecurrenceRule, RecurrenceSpec};
    use crate::time::Instant;
    use chrono::{Duration, NaiveDate};

    fn day(d: u32) -> Instant {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn week() -> DateRange {
        DateRange::new(day(16), day(22) + Duration::hours(23))
    }

    fn task(id: &str, due: Option<Instant>, completed: bool) -> ToDoTask {
        ToDoTask {
            id: id.to_string(),
            series_id: None,
            title: id.to_string(),
            category: TaskCategory::General,
            assignee_ids: vec!["m1".to_string()],
            due_date: due,
            is_completed: completed,
            recurrence: None,
        }
    }

    #[test]
    fn backlog_is_always_visible() {
        assert!(is_task_visible(&task("t", None, false), &week()));
        assert!(is_task_visible(&task("t", None, true), &week()));
    }

    #[test]
    fn overdue_carries_forward_until_completed() {
        let overdue = task("t", Some(day(13)), false);
        assert!(is_task_visible(&overdue, &week()));
        let done = task("t", Some(day(13)), true);
        assert!(!is_task_visible(&done, &week()));
    }

    #[test]
    fn future_tasks_are_hidden() {
        assert!(!is_task_visible(&task("t", Some(day(25)), false), &week()));
    }

    #[test]
    fn in_range_shows_regardless_of_completion() {
        assert!(is_task_visible(&task("t", Some(day(18)), true), &week()));
    }

    #[test]
    fn sort_order() {
        let mut tasks = vec![
            task("done", Some(day(1)), true),
            task("undated", None, false),
            task("late", Some(day(20)), false),
            task("early", Some(day(17)), false),
        ];
        sort_tasks(&mut tasks);
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late", "undated", "done"]);
    }

    #[test]
    fn member_filter() {
        let mut other = task("other", None, false);
        other.assignee_ids = vec!["m2".to_string()];
        let tasks = vec![task("mine", None, false), other];
        assert_eq!(filter_by_member(&tasks, Some("m1")).len(), 1);
        assert_eq!(filter_by_member(&tasks, None).len(), 2);
    }

    #[test]
    fn visible_events_expands_and_filters() {
        let events = vec![
            CalendarEvent {
                id: "e1".to_string(),
                title: "Soccer".to_string(),
                start: day(3) + Duration::hours(16),
                end: day(3) + Duration::hours(17),
                location: None,
                member_ids: vec!["m3".to_string()],
                recurrence: Some(RecurrenceSpec::new(RecurrenceRule::Weekly, None)),
            },
            CalendarEvent {
                id: "e2".to_string(),
                title: "Dinner".to_string(),
                start: day(17) + Duration::hours(19),
                end: day(17) + Duration::hours(20),
                location: None,
                member_ids: vec!["m1".to_string()],
                recurrence: None,
            },
        ];

        let all = visible_events(&events, &week(), None);
        let ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1_inst_2", "e2"]);

        let leo = visible_events(&events, &week(), Some("m3"));
        assert_eq!(leo.len(), 1);
        assert!(leo[0].is_virtual());
    }

    #[test]
    fn task_list_pipeline() {
        let mut shopping = task("milk", Some(day(17)), false);
        shopping.category = TaskCategory::Shopping;
        let chores = task("trash", Some(day(18)), false);
        let list = task_list(&[shopping, chores], &week(), Some(TaskCategory::Shopping), Some("m1"));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "milk");
    }
}
