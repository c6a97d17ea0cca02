//! Mutations over a [`Household`] snapshot.
//!
//! Every operation leaves `self` untouched and returns the next snapshot with
//! an [`Effect`]. Validation failures are errors and produce no snapshot.
//! Unknown ids and ids of virtual occurrences are not errors: the snapshot
//! comes back unchanged with [`Effect::Ignored`].

use chrono::Duration;
use uuid::Uuid;

use crate::error::{FamSyncError, FamSyncResult};
use crate::event::{CalendarEvent, DEFAULT_EVENT_MINUTES, DEFAULT_EVENT_TITLE, EventPatch, NewEvent};
use crate::household::Household;
use crate::member::{self, Color, Member, MemberId};
use crate::recurrence;
use crate::series;
use crate::task::{DEFAULT_TASK_TITLE, NewTask, TaskPatch, ToDoTask};
use crate::time::{self, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotFound,
    VirtualOccurrence,
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Created(String),
    Updated {
        id: String,
        /// Next series instance spawned by completing the task.
        spawned: Option<String>,
    },
    Deleted(String),
    Toggled {
        id: String,
        completed: bool,
        spawned: Option<String>,
    },
    Ignored(IgnoreReason),
}

/// A snapshot paired with the effect that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub household: Household,
    pub effect: Effect,
}

impl Applied {
    fn ignored(household: &Household, reason: IgnoreReason) -> Self {
        Applied {
            household: household.clone(),
            effect: Effect::Ignored(reason),
        }
    }
}

/// Partial update for a member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub color: Option<Color>,
}

/// Every mutation the command layer accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddMember { name: String, color: Option<Color> },
    UpdateMember { id: String, patch: MemberPatch },
    DeleteMember { id: String },
    AddEvent(NewEvent),
    UpdateEvent { id: String, patch: EventPatch },
    DeleteEvent { id: String },
    DropEvent { id: String, new_start: Instant },
    AddTask(NewTask),
    UpdateTask { id: String, patch: TaskPatch },
    DeleteTask { id: String },
    ToggleTask { id: String },
}

impl Household {
    pub fn apply(&self, command: Command) -> FamSyncResult<Applied> {
        let result = match command {
            Command::AddMember { name, color } => self.add_member(&name, color),
            Command::UpdateMember { id, patch } => self.update_member(&id, &patch),
            Command::DeleteMember { id } => Ok(self.delete_member(&id)),
            Command::AddEvent(new) => self.add_event(new),
            Command::UpdateEvent { id, patch } => self.update_event(&id, &patch),
            Command::DeleteEvent { id } => Ok(self.delete_event(&id)),
            Command::DropEvent { id, new_start } => self.drop_event(&id, new_start),
            Command::AddTask(new) => self.add_task(new),
            Command::UpdateTask { id, patch } => self.update_task(&id, &patch),
            Command::DeleteTask { id } => Ok(self.delete_task(&id)),
            Command::ToggleTask { id } => Ok(self.toggle_task(&id)),
        };

        match &result {
            Ok(applied) => tracing::debug!(effect = ?applied.effect, "command applied"),
            Err(e) => tracing::warn!(error = %e, "command rejected"),
        }

        result
    }

    // =========================================================================
    // Members
    // =========================================================================

    pub fn add_member(&self, name: &str, color: Option<Color>) -> FamSyncResult<Applied> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FamSyncError::Validation("A member needs a name".into()));
        }

        let color = member::pick_color(&self.members, color);
        let new_member = Member::new(name, color);
        let id = new_member.id.clone();

        let mut next = self.clone();
        next.members.push(new_member);

        Ok(Applied {
            household: next,
            effect: Effect::Created(id),
        })
    }

    pub fn update_member(&self, id: &str, patch: &MemberPatch) -> FamSyncResult<Applied> {
        if self.member(id).is_none() {
            return Ok(Applied::ignored(self, IgnoreReason::NotFound));
        }
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(FamSyncError::Validation("A member needs a name".into()));
        }

        let mut next = self.clone();
        if let Some(m) = next.members.iter_mut().find(|m| m.id == id) {
            if let Some(name) = &patch.name {
                m.name = name.trim().to_string();
            }
            if let Some(color) = patch.color {
                m.color = color;
            }
        }

        Ok(Applied {
            household: next,
            effect: Effect::Updated {
                id: id.to_string(),
                spawned: None,
            },
        })
    }

    /// Remove a member. Events and tasks keep referencing the id.
    pub fn delete_member(&self, id: &str) -> Applied {
        if self.member(id).is_none() {
            return Applied::ignored(self, IgnoreReason::NotFound);
        }

        let mut next = self.clone();
        next.members.retain(|m| m.id != id);

        Applied {
            household: next,
            effect: Effect::Deleted(id.to_string()),
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn add_event(&self, new: NewEvent) -> FamSyncResult<Applied> {
        self.add_event_lasting(new, Duration::minutes(DEFAULT_EVENT_MINUTES))
    }

    /// Add an event; one created without an end lasts `default_length`.
    pub fn add_event_lasting(&self, new: NewEvent, default_length: Duration) -> FamSyncResult<Applied> {
        let end = match new.end {
            Some(end) => end,
            None => time::checked_shift(new.start, default_length)?,
        };
        if end < new.start {
            return Err(FamSyncError::Validation(
                "An event cannot end before it starts".into(),
            ));
        }

        let mut member_ids = dedupe(new.member_ids);
        if member_ids.is_empty() {
            if let Some(first) = self.members.first() {
                member_ids.push(first.id.clone());
            }
        }

        let event = CalendarEvent {
            id: Uuid::new_v4().to_string(),
            title: non_blank(new.title).unwrap_or_else(|| DEFAULT_EVENT_TITLE.to_string()),
            start: new.start,
            end,
            location: non_blank(new.location),
            member_ids,
            recurrence: new.recurrence,
        };
        let id = event.id.clone();

        let mut next = self.clone();
        next.events.push(event);

        Ok(Applied {
            household: next,
            effect: Effect::Created(id),
        })
    }

    pub fn update_event(&self, id: &str, patch: &EventPatch) -> FamSyncResult<Applied> {
        if recurrence::is_virtual_id(id) {
            return Ok(Applied::ignored(self, IgnoreReason::VirtualOccurrence));
        }
        let Some(existing) = self.event(id) else {
            return Ok(Applied::ignored(self, IgnoreReason::NotFound));
        };

        let mut updated = existing.clone();
        updated.apply_patch(patch);
        updated.member_ids = dedupe(updated.member_ids);
        if updated.end < updated.start {
            return Err(FamSyncError::Validation(
                "An event cannot end before it starts".into(),
            ));
        }

        let mut next = self.clone();
        if let Some(slot) = next.events.iter_mut().find(|e| e.id == id) {
            *slot = updated;
        }

        Ok(Applied {
            household: next,
            effect: Effect::Updated {
                id: id.to_string(),
                spawned: None,
            },
        })
    }

    pub fn delete_event(&self, id: &str) -> Applied {
        if recurrence::is_virtual_id(id) {
            return Applied::ignored(self, IgnoreReason::VirtualOccurrence);
        }
        if self.event(id).is_none() {
            return Applied::ignored(self, IgnoreReason::NotFound);
        }

        let mut next = self.clone();
        next.events.retain(|e| e.id != id);

        Applied {
            household: next,
            effect: Effect::Deleted(id.to_string()),
        }
    }

    /// Reschedule an event to `new_start`, keeping its duration.
    pub fn drop_event(&self, id: &str, new_start: Instant) -> FamSyncResult<Applied> {
        if recurrence::is_virtual_id(id) {
            return Ok(Applied::ignored(self, IgnoreReason::VirtualOccurrence));
        }
        let Some(event) = self.event(id) else {
            return Ok(Applied::ignored(self, IgnoreReason::NotFound));
        };

        self.update_event(id, &EventPatch::reschedule(new_start, event.duration())?)
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    pub fn add_task(&self, new: NewTask) -> FamSyncResult<Applied> {
        let assignee_ids = dedupe(new.assignee_ids);
        if assignee_ids.is_empty() {
            return Err(FamSyncError::Validation(
                "A task must be assigned to at least one family member".into(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let series_id = new
            .recurrence
            .map(|_| new.series_id.clone().unwrap_or_else(|| id.clone()));

        let task = ToDoTask {
            id: id.clone(),
            series_id,
            title: non_blank(new.title).unwrap_or_else(|| DEFAULT_TASK_TITLE.to_string()),
            category: new.category.unwrap_or_default(),
            assignee_ids,
            due_date: new.due_date,
            is_completed: false,
            recurrence: new.recurrence,
        };

        let mut next = self.clone();
        next.tasks.push(task);

        Ok(Applied {
            household: next,
            effect: Effect::Created(id),
        })
    }

    /// Patch a task. Setting `is_completed` goes through the series
    /// lifecycle, so completing a recurring task spawns its next instance.
    pub fn update_task(&self, id: &str, patch: &TaskPatch) -> FamSyncResult<Applied> {
        if recurrence::is_virtual_id(id) {
            return Ok(Applied::ignored(self, IgnoreReason::VirtualOccurrence));
        }
        let Some(existing) = self.task(id) else {
            return Ok(Applied::ignored(self, IgnoreReason::NotFound));
        };

        let mut updated = existing.clone();
        updated.apply_patch(patch);
        updated.assignee_ids = dedupe(updated.assignee_ids);
        if updated.assignee_ids.is_empty() {
            return Err(FamSyncError::Validation(
                "A task must be assigned to at least one family member".into(),
            ));
        }

        let mut spawned = None;
        if let Some(completed) = patch.is_completed {
            let toggled = series::set_completion(&updated, completed, &self.tasks);
            updated = toggled.task;
            spawned = toggled.spawned;
        }

        let spawned_id = spawned.as_ref().map(|t| t.id.clone());
        let next = self.replace_task(updated, spawned);

        Ok(Applied {
            household: next,
            effect: Effect::Updated {
                id: id.to_string(),
                spawned: spawned_id,
            },
        })
    }

    pub fn delete_task(&self, id: &str) -> Applied {
        if recurrence::is_virtual_id(id) {
            return Applied::ignored(self, IgnoreReason::VirtualOccurrence);
        }
        if self.task(id).is_none() {
            return Applied::ignored(self, IgnoreReason::NotFound);
        }

        let mut next = self.clone();
        next.tasks.retain(|t| t.id != id);

        Applied {
            household: next,
            effect: Effect::Deleted(id.to_string()),
        }
    }

    /// Flip a task's completion; completing a recurring task spawns the next
    /// instance of its series.
    pub fn toggle_task(&self, id: &str) -> Applied {
        if recurrence::is_virtual_id(id) {
            return Applied::ignored(self, IgnoreReason::VirtualOccurrence);
        }
        let Some(task) = self.task(id) else {
            return Applied::ignored(self, IgnoreReason::NotFound);
        };

        let toggled = series::toggle_completion(task, &self.tasks);
        let completed = toggled.task.is_completed;
        let spawned_id = toggled.spawned.as_ref().map(|t| t.id.clone());

        if let Some(next_task) = &toggled.spawned {
            tracing::info!(task = %id, next = %next_task.id, "spawned next series instance");
        }

        Applied {
            household: self.replace_task(toggled.task, toggled.spawned),
            effect: Effect::Toggled {
                id: id.to_string(),
                completed,
                spawned: spawned_id,
            },
        }
    }

    fn replace_task(&self, updated: ToDoTask, spawned: Option<ToDoTask>) -> Household {
        let mut next = self.clone();
        if let Some(slot) = next.tasks.iter_mut().find(|t| t.id == updated.id) {
            *slot = updated;
        }
        next.tasks.extend(spawned);
        next
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Drop repeated ids, keeping first occurrences in order.
fn dedupe(ids: Vec<MemberId>) -> Vec<MemberId> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}
