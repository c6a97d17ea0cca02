//! To-do tasks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FamSyncError;
use crate::member::MemberId;
use crate::recurrence::{self, RecurrenceRule, RecurrenceSpec};
use crate::time::Instant;

/// Title used when a task is created without one.
pub const DEFAULT_TASK_TITLE: &str = "New Task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Shopping,
    Chores,
    #[default]
    General,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 3] = [
        TaskCategory::Shopping,
        TaskCategory::Chores,
        TaskCategory::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::Shopping => "shopping",
            TaskCategory::Chores => "chores",
            TaskCategory::General => "general",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = FamSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shopping" => Ok(TaskCategory::Shopping),
            "chores" => Ok(TaskCategory::Chores),
            "general" => Ok(TaskCategory::General),
            other => Err(FamSyncError::Validation(format!(
                "Unknown task type '{other}'. Expected shopping, chores or general"
            ))),
        }
    }
}

/// A to-do task.
///
/// `series_id` is set once a task is, or has ever been, recurring; every
/// instance of one lineage shares it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToDoTask {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    pub title: String,
    #[serde(rename = "type", default)]
    pub category: TaskCategory,
    pub assignee_ids: Vec<MemberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Instant>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceSpec>,
}

impl ToDoTask {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Lineage key: the series id, or the task's own id for a task that
    /// never recurred.
    pub fn series_key(&self) -> &str {
        self.series_id.as_deref().unwrap_or(&self.id)
    }

    /// Apply a partial update, leaving unspecified fields untouched.
    /// Completion is handled by the series lifecycle, not here.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(assignee_ids) = &patch.assignee_ids {
            self.assignee_ids = assignee_ids.clone();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        self.recurrence = recurrence::merge_recurrence(
            self.recurrence,
            patch.rule,
            patch.until,
            patch.clear_recurrence,
        );
        if self.recurrence.is_some() && self.series_id.is_none() {
            self.series_id = Some(self.id.clone());
        }
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: Option<String>,
    pub category: Option<TaskCategory>,
    pub assignee_ids: Vec<MemberId>,
    pub due_date: Option<Instant>,
    pub recurrence: Option<RecurrenceSpec>,
    /// Joins an existing lineage instead of starting a new one.
    pub series_id: Option<String>,
}

/// Partial update for a task. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub category: Option<TaskCategory>,
    pub assignee_ids: Option<Vec<MemberId>>,
    pub due_date: Option<Instant>,
    pub is_completed: Option<bool>,
    pub rule: Option<RecurrenceRule>,
    pub until: Option<Instant>,
    pub clear_recurrence: bool,
}
