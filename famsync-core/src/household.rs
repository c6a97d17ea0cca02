//! The canonical collections a caller holds.

use serde::{Deserialize, Serialize};

use crate::event::CalendarEvent;
use crate::member::{self, Member};
use crate::task::ToDoTask;

/// Snapshot of members, events and tasks.
///
/// Command operations take `&self` and return a new snapshot; the caller
/// decides when to persist or re-render it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Household {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    #[serde(default)]
    pub tasks: Vec<ToDoTask>,
}

impl Household {
    pub fn new(members: Vec<Member>, events: Vec<CalendarEvent>, tasks: Vec<ToDoTask>) -> Self {
        Household {
            members,
            events,
            tasks,
        }
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn event(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&ToDoTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Display name for a member id; "unknown" if it no longer resolves.
    pub fn member_name(&self, id: &str) -> &str {
        member::member_name(&self.members, id)
    }

    pub fn member_names(&self, ids: &[String]) -> Vec<String> {
        member::member_names(&self.members, ids)
    }
}
