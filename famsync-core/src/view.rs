//! What a calendar view shows: its mode, anchor date and member filter.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::error::FamSyncError;
use crate::event::CalendarEvent;
use crate::household::Household;
use crate::member::MemberId;
use crate::task::{TaskCategory, ToDoTask};
use crate::time::{self, Instant, WeekStart};
use crate::visibility;

/// Days of events an agenda view covers.
pub const AGENDA_EVENT_DAYS: i64 = 7;

/// Days of tasks an agenda view covers.
pub const AGENDA_TASK_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Month,
    #[default]
    Week,
    Agenda,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Month => "month",
            ViewMode::Week => "week",
            ViewMode::Agenda => "agenda",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = FamSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "month" => Ok(ViewMode::Month),
            "week" => Ok(ViewMode::Week),
            "agenda" => Ok(ViewMode::Agenda),
            other => Err(FamSyncError::Validation(format!(
                "Unknown view '{other}'. Expected month, week or agenda"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub mode: ViewMode,
    pub anchor: Instant,
    pub member_filter: Option<MemberId>,
    pub week_start: WeekStart,
}

/// Everything a view renders, computed from one household snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub label: String,
    pub event_range: DateRange,
    pub task_range: DateRange,
    pub events: Vec<CalendarEvent>,
    pub tasks: Vec<ToDoTask>,
}

impl ViewDescriptor {
    pub fn new(mode: ViewMode, anchor: Instant) -> Self {
        ViewDescriptor {
            mode,
            anchor,
            member_filter: None,
            week_start: WeekStart::default(),
        }
    }

    pub fn with_member(mut self, member: Option<MemberId>) -> Self {
        self.member_filter = member;
        self
    }

    pub fn with_week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = week_start;
        self
    }

    /// Window for events. A month view covers its whole grid, including the
    /// leading and trailing days of neighbouring months.
    pub fn event_range(&self) -> DateRange {
        match self.mode {
            ViewMode::Month => DateRange::new(
                time::start_of_week(time::start_of_month(self.anchor), self.week_start),
                time::end_of_week(time::end_of_month(self.anchor), self.week_start),
            ),
            ViewMode::Week => self.week_range(),
            ViewMode::Agenda => {
                let start = time::start_of_day(self.anchor);
                DateRange::new(start, start + Duration::days(AGENDA_EVENT_DAYS))
            }
        }
    }

    /// Window for tasks. Narrower than the event window in month and agenda
    /// views.
    pub fn task_range(&self) -> DateRange {
        match self.mode {
            ViewMode::Month => DateRange::new(
                time::start_of_month(self.anchor),
                time::end_of_month(self.anchor),
            ),
            ViewMode::Week => self.week_range(),
            ViewMode::Agenda => {
                let start = time::start_of_day(self.anchor);
                DateRange::new(start, start + Duration::days(AGENDA_TASK_DAYS))
            }
        }
    }

    fn week_range(&self) -> DateRange {
        DateRange::new(
            time::start_of_week(self.anchor, self.week_start),
            time::end_of_week(self.anchor, self.week_start),
        )
    }

    pub fn label(&self) -> String {
        match self.mode {
            ViewMode::Month => self.anchor.format("%B %Y").to_string(),
            ViewMode::Week => format!(
                "Week of {}",
                time::start_of_week(self.anchor, self.week_start).format("%b %-d")
            ),
            ViewMode::Agenda => "Next 3 Days".to_string(),
        }
    }

    pub fn next(&self) -> Self {
        self.shifted(1)
    }

    pub fn previous(&self) -> Self {
        self.shifted(-1)
    }

    fn shifted(&self, direction: i32) -> Self {
        let anchor = match self.mode {
            ViewMode::Month => time::add_months(self.anchor, direction),
            ViewMode::Week | ViewMode::Agenda => time::add_weeks(self.anchor, i64::from(direction)),
        };
        ViewDescriptor {
            anchor,
            ..self.clone()
        }
    }

    pub fn today(&self, now: Instant) -> Self {
        ViewDescriptor {
            anchor: now,
            ..self.clone()
        }
    }

    /// Drop the member filter if it points at `member_id`.
    pub fn forget_member(&mut self, member_id: &str) {
        if self.member_filter.as_deref() == Some(member_id) {
            self.member_filter = None;
        }
    }

    pub fn materialize(&self, household: &Household, category: Option<TaskCategory>) -> ViewSnapshot {
        let event_range = self.event_range();
        let task_range = self.task_range();
        let member = self.member_filter.as_deref();

        ViewSnapshot {
            label: self.label(),
            event_range,
            task_range,
            events: visibility::visible_events(&household.events, &event_range, member),
            tasks: visibility::task_list(&household.tasks, &task_range, category, member),
        }
    }
}
