//! Calendar events.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::FamSyncResult;
use crate::member::MemberId;
use crate::recurrence::{self, RecurrenceRule, RecurrenceSpec};
use crate::time::{self, Instant};

/// Title used when an event is created without one.
pub const DEFAULT_EVENT_TITLE: &str = "New Event";

/// A calendar event. With a recurrence it is the anchor of a series of
/// derived occurrences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: Instant,
    pub end: Instant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<MemberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceSpec>,
}

impl CalendarEvent {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True for occurrences synthesized by recurrence expansion.
    pub fn is_virtual(&self) -> bool {
        recurrence::is_virtual_id(&self.id)
    }

    /// Id of the stored event this occurrence was derived from.
    pub fn anchor_id(&self) -> &str {
        recurrence::anchor_id(&self.id)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Apply a partial update, leaving unspecified fields untouched.
    pub fn apply_patch(&mut self, patch: &EventPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(start) = patch.start {
            self.start = start;
        }
        if let Some(end) = patch.end {
            self.end = end;
        }
        if let Some(location) = &patch.location {
            self.location = if location.is_empty() {
                None
            } else {
                Some(location.clone())
            };
        }
        if let Some(member_ids) = &patch.member_ids {
            self.member_ids = member_ids.clone();
        }
        self.recurrence = recurrence::merge_recurrence(
            self.recurrence,
            patch.rule,
            patch.until,
            patch.clear_recurrence,
        );
    }
}

/// Length in minutes of an event created without an end.
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

/// Input for creating an event. Missing fields get defaults when applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: Option<String>,
    pub start: Instant,
    pub end: Option<Instant>,
    pub location: Option<String>,
    pub member_ids: Vec<MemberId>,
    pub recurrence: Option<RecurrenceSpec>,
}

impl NewEvent {
    pub fn at(start: Instant) -> Self {
        NewEvent {
            title: None,
            start,
            end: None,
            location: None,
            member_ids: Vec::new(),
            recurrence: None,
        }
    }
}

/// Partial update for an event. `None` keeps the current value; an empty
/// `location` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<Instant>,
    pub end: Option<Instant>,
    pub location: Option<String>,
    pub member_ids: Option<Vec<MemberId>>,
    pub rule: Option<RecurrenceRule>,
    pub until: Option<Instant>,
    pub clear_recurrence: bool,
}

impl EventPatch {
    /// Move to `new_start`, keeping `duration`.
    pub fn reschedule(new_start: Instant, duration: Duration) -> FamSyncResult<Self> {
        Ok(EventPatch {
            start: Some(new_start),
            end: Some(time::checked_shift(new_start, duration)?),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> Instant {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn make_test_event() -> CalendarEvent {
        CalendarEvent {
            id: "e1".to_string(),
            title: "Yoga Class".to_string(),
            start: at(20, 9),
            end: at(20, 10),
            location: Some("Community Center".to_string()),
            member_ids: vec!["m1".to_string()],
            recurrence: Some(RecurrenceSpec::new(RecurrenceRule::Weekly, None)),
        }
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut event = make_test_event();
        event.apply_patch(&EventPatch::default());
        assert_eq!(event, make_test_event());
    }

    #[test]
    fn patch_title_keeps_everything_else() {
        let mut event = make_test_event();
        event.apply_patch(&EventPatch {
            title: Some("Pilates".to_string()),
            ..Default::default()
        });
        assert_eq!(event.title, "Pilates");
        assert_eq!(event.location, make_test_event().location);
        assert_eq!(event.recurrence, make_test_event().recurrence);
    }

    #[test]
    fn empty_location_clears() {
        let mut event = make_test_event();
        event.apply_patch(&EventPatch {
            location: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(event.location, None);
    }

    #[test]
    fn reschedule_keeps_duration() {
        let mut event = make_test_event();
        event.apply_patch(&EventPatch::reschedule(at(21, 14), event.duration()).unwrap());
        assert_eq!(event.start, at(21, 14));
        assert_eq!(event.end, at(21, 15));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(make_test_event()).unwrap();
        assert_eq!(json["memberIds"][0], "m1");
        assert_eq!(json["recurrence"]["rule"], "weekly");
        assert_eq!(json["start"], "2025-03-20T09:00:00");
    }
}
