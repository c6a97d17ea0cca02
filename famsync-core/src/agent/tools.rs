//! The fixed tool catalog and its dispatch onto the command layer.
//!
//! Arguments arrive as loosely typed JSON from the model. Dates are ISO-8601
//! strings and member ids may come as an array, a single string, or under a
//! singular field name. Every call produces a JSON object; failures become
//! `{"error": "..."}` and never abort the surrounding loop.

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::agent::recommendation::{Recommendation, RecommendationBoard};
use crate::command::{Applied, Effect, IgnoreReason, MemberPatch};
use crate::date_range::DateRange;
use crate::error::{FamSyncError, FamSyncResult};
use crate::event::{CalendarEvent, EventPatch, NewEvent};
use crate::household::Household;
use crate::member::{Color, MemberId};
use crate::recurrence::{RecurrenceRule, RecurrenceSpec};
use crate::task::{NewTask, TaskCategory, TaskPatch, ToDoTask};
use crate::time::{self, Instant};
use crate::visibility;

pub const LIST_MEMBERS: &str = "list_members";
pub const ADD_MEMBER: &str = "add_member";
pub const UPDATE_MEMBER: &str = "update_member";
pub const DELETE_MEMBER: &str = "delete_member";
pub const LIST_EVENTS: &str = "list_events";
pub const ADD_EVENT: &str = "add_event";
pub const UPDATE_EVENT: &str = "update_event";
pub const DELETE_EVENT: &str = "delete_event";
pub const LIST_TASKS: &str = "list_tasks";
pub const ADD_TASK: &str = "add_task";
pub const UPDATE_TASK: &str = "update_task";
pub const DELETE_TASK: &str = "delete_task";
pub const DISPLAY_RECOMMENDATIONS: &str = "display_recommendations";

/// Name, description and JSON-schema argument contract of one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        ToolCall {
            name: name.into(),
            args,
        }
    }
}

/// Snapshot after a tool call, and the JSON handed back to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub household: Household,
    pub result: Value,
}

fn rule_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["daily", "weekly", "monthly"],
        "description": "Optional recurrence"
    })
}

fn id_schema(what: &str) -> Value {
    json!({ "type": "string", "description": format!("The {what} ID") })
}

/// The full catalog, in a stable order.
pub fn catalog() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: LIST_MEMBERS,
            description: "Get a list of all family members and their IDs.",
            parameters: json!({ "type": "object", "properties": {} }),
        },
        ToolSpec {
            name: ADD_MEMBER,
            description: "Add a new family member.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Name of the new member" },
                    "color": {
                        "type": "string",
                        "description": "Optional preferred color key (rose, blue, green, purple, ...)"
                    }
                },
                "required": ["name"]
            }),
        },
        ToolSpec {
            name: UPDATE_MEMBER,
            description: "Update a family member's name or color.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "id": id_schema("Member"),
                    "name": { "type": "string", "description": "New name" },
                    "color": { "type": "string", "description": "New color key" }
                },
                "required": ["id"]
            }),
        },
        ToolSpec {
            name: DELETE_MEMBER,
            description: "Remove a family member.",
            parameters: json!({
                "type": "object",
                "properties": { "id": id_schema("Member") },
                "required": ["id"]
            }),
        },
        ToolSpec {
            name: LIST_EVENTS,
            description: "List calendar events within a date range to find IDs or check availability. \
                          Defaults to the next 7 days.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "start": { "type": "string", "description": "Start date (ISO)" },
                    "end": { "type": "string", "description": "End date (ISO)" },
                    "memberId": { "type": "string", "description": "Optional: filter by member" }
                }
            }),
        },
        ToolSpec {
            name: ADD_EVENT,
            description: "Create a new calendar event.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "start": { "type": "string", "description": "ISO date string" },
                    "end": { "type": "string", "description": "ISO date string" },
                    "location": { "type": "string" },
                    "memberIds": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "List of family member IDs"
                    },
                    "recurringRule": rule_schema(),
                    "recurrenceEnd": { "type": "string", "description": "ISO date when the recurrence stops" }
                },
                "required": ["title", "start", "end", "memberIds"]
            }),
        },
        ToolSpec {
            name: UPDATE_EVENT,
            description: "Update an existing event. Only provide fields that need changing.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "id": id_schema("Event"),
                    "title": { "type": "string" },
                    "start": { "type": "string" },
                    "end": { "type": "string" },
                    "location": { "type": "string" },
                    "memberIds": { "type": "array", "items": { "type": "string" } },
                    "recurringRule": rule_schema(),
                    "recurrenceEnd": { "type": "string" }
                },
                "required": ["id"]
            }),
        },
        ToolSpec {
            name: DELETE_EVENT,
            description: "Delete a calendar event.",
            parameters: json!({
                "type": "object",
                "properties": { "id": id_schema("Event") },
                "required": ["id"]
            }),
        },
        ToolSpec {
            name: LIST_TASKS,
            description: "List to-do tasks to find IDs.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "type": { "type": "string", "enum": ["shopping", "chores", "general", "all"] },
                    "memberId": { "type": "string", "description": "Optional: filter by member" }
                }
            }),
        },
        ToolSpec {
            name: ADD_TASK,
            description: "Create a new to-do task. Must have at least one assignee.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "type": { "type": "string", "enum": ["shopping", "chores", "general"] },
                    "dueDate": { "type": "string", "description": "ISO date string" },
                    "assigneeIds": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "List of member IDs (required)"
                    },
                    "recurringRule": rule_schema(),
                    "recurrenceEnd": { "type": "string", "description": "ISO date when the recurrence stops" }
                },
                "required": ["title", "type", "assigneeIds"]
            }),
        },
        ToolSpec {
            name: UPDATE_TASK,
            description: "Update an existing task. Completing a recurring task schedules its next instance.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "id": id_schema("Task"),
                    "title": { "type": "string" },
                    "type": { "type": "string", "enum": ["shopping", "chores", "general"] },
                    "isCompleted": { "type": "boolean" },
                    "dueDate": { "type": "string" },
                    "assigneeIds": { "type": "array", "items": { "type": "string" } },
                    "recurringRule": rule_schema(),
                    "recurrenceEnd": { "type": "string" }
                },
                "required": ["id"]
            }),
        },
        ToolSpec {
            name: DELETE_TASK,
            description: "Delete a task.",
            parameters: json!({
                "type": "object",
                "properties": { "id": id_schema("Task") },
                "required": ["id"]
            }),
        },
        ToolSpec {
            name: DISPLAY_RECOMMENDATIONS,
            description: "Display recommended events or tasks the user can add with one click.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "recommendations": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "title": { "type": "string" },
                                "description": { "type": "string" },
                                "category": { "type": "string", "enum": ["event", "task"] },
                                "suggestedAssigneeId": {
                                    "type": "string",
                                    "description": "Optional: who might be best for this"
                                },
                                "data": {
                                    "type": "object",
                                    "description": "Arguments for add_event or add_task (omit unknown IDs)"
                                }
                            },
                            "required": ["title", "description", "category", "data"]
                        }
                    }
                },
                "required": ["recommendations"]
            }),
        },
    ]
}

pub fn find(name: &str) -> Option<ToolSpec> {
    catalog().into_iter().find(|t| t.name == name)
}

// =============================================================================
// Arguments
// =============================================================================

/// Member ids as the model sends them: one id or a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum IdList {
    One(String),
    Many(Vec<String>),
}

/// Resolve `ids`, falling back to a singular field.
///
/// Returns `None` when neither is present, so patches can tell "not given"
/// from "cleared".
pub(crate) fn normalize_ids(ids: Option<&IdList>, singular: Option<&str>) -> Option<Vec<MemberId>> {
    match (ids, singular) {
        (Some(IdList::Many(ids)), _) => Some(ids.clone()),
        (Some(IdList::One(id)), _) => Some(vec![id.clone()]),
        (None, Some(id)) => Some(vec![id.to_string()]),
        (None, None) => None,
    }
}

#[derive(Debug, Default, Deserialize)]
struct MemberArgs {
    id: Option<String>,
    name: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IdArgs {
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEventsArgs {
    start: Option<String>,
    end: Option<String>,
    member_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventArgs {
    pub id: Option<String>,
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: Option<String>,
    pub member_ids: Option<IdList>,
    pub member_id: Option<String>,
    pub recurring_rule: Option<String>,
    pub recurrence_end: Option<String>,
}

impl EventArgs {
    pub fn members(&self) -> Option<Vec<MemberId>> {
        normalize_ids(self.member_ids.as_ref(), self.member_id.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksArgs {
    #[serde(rename = "type")]
    category: Option<String>,
    member_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskArgs {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
    pub due_date: Option<String>,
    pub is_completed: Option<bool>,
    pub assignee_ids: Option<IdList>,
    pub assigned_to: Option<String>,
    pub recurring_rule: Option<String>,
    pub recurrence_end: Option<String>,
}

impl TaskArgs {
    pub fn assignees(&self) -> Option<Vec<MemberId>> {
        normalize_ids(self.assignee_ids.as_ref(), self.assigned_to.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationArgs {
    recommendations: Vec<Recommendation>,
}

/// Deserialize tool arguments; a missing or null payload counts as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned + Default>(tool: &str, args: &Value) -> FamSyncResult<T> {
    if args.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(args.clone()).map_err(|e| FamSyncError::InvalidToolArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

fn required<'a>(tool: &str, field: &str, value: Option<&'a str>) -> FamSyncResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| FamSyncError::InvalidToolArguments {
            tool: tool.to_string(),
            reason: format!("missing required field '{field}'"),
        })
}

pub(crate) fn parse_optional_instant(value: Option<&str>) -> FamSyncResult<Option<Instant>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(time::parse_instant)
        .transpose()
}

pub(crate) fn parse_rule(value: Option<&str>) -> FamSyncResult<Option<RecurrenceRule>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.parse::<RecurrenceRule>())
        .transpose()
}

/// Recurrence for a new entity. An end without a rule is ignored.
pub(crate) fn new_recurrence(
    rule: Option<&str>,
    until: Option<&str>,
) -> FamSyncResult<Option<RecurrenceSpec>> {
    let Some(rule) = parse_rule(rule)? else {
        return Ok(None);
    };
    Ok(Some(RecurrenceSpec::new(rule, parse_optional_instant(until)?)))
}

fn parse_category(value: Option<&str>) -> FamSyncResult<Option<TaskCategory>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => s.parse::<TaskCategory>().map(Some),
    }
}

/// Colors outside the palette are treated as no preference.
fn parse_color(value: Option<&str>) -> Option<Color> {
    value.and_then(|c| c.parse().ok())
}

// =============================================================================
// Dispatch
// =============================================================================

/// Execute one tool call against `household`.
///
/// Events added without an end last `event_length`. `turn_id` keys any
/// recommendations the call posts to `board`.
pub fn execute(
    household: &Household,
    call: &ToolCall,
    now: Instant,
    event_length: Duration,
    turn_id: &str,
    board: &mut RecommendationBoard,
) -> ToolOutcome {
    match dispatch(household, call, now, event_length, turn_id, board) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(tool = %call.name, error = %e, "tool call failed");
            ToolOutcome {
                household: household.clone(),
                result: json!({ "error": e.to_string() }),
            }
        }
    }
}

fn dispatch(
    household: &Household,
    call: &ToolCall,
    now: Instant,
    event_length: Duration,
    turn_id: &str,
    board: &mut RecommendationBoard,
) -> FamSyncResult<ToolOutcome> {
    let tool = call.name.as_str();
    tracing::debug!(tool, args = %call.args, "executing tool");

    let read_only = |result: Value| ToolOutcome {
        household: household.clone(),
        result,
    };

    match tool {
        LIST_MEMBERS => Ok(read_only(list_members(household))),
        ADD_MEMBER => {
            let args: MemberArgs = parse_args(tool, &call.args)?;
            let name = required(tool, "name", args.name.as_deref())?;
            let applied = household.add_member(name, parse_color(args.color.as_deref()))?;
            let mut result = effect_result(&applied.effect);
            result["message"] = json!(format!("Added {}", name.trim()));
            Ok(ToolOutcome {
                household: applied.household,
                result,
            })
        }
        UPDATE_MEMBER => {
            let args: MemberArgs = parse_args(tool, &call.args)?;
            let id = required(tool, "id", args.id.as_deref())?;
            let patch = MemberPatch {
                name: args.name.clone(),
                color: parse_color(args.color.as_deref()),
            };
            Ok(applied_outcome(household.update_member(id, &patch)?))
        }
        DELETE_MEMBER => {
            let args: IdArgs = parse_args(tool, &call.args)?;
            let id = required(tool, "id", args.id.as_deref())?;
            Ok(applied_outcome(household.delete_member(id)))
        }
        LIST_EVENTS => {
            let args: ListEventsArgs = parse_args(tool, &call.args)?;
            let range = DateRange::from_args(args.start.as_deref(), args.end.as_deref(), now)?;
            Ok(read_only(list_events(household, &range, args.member_id.as_deref())))
        }
        ADD_EVENT => {
            let args: EventArgs = parse_args(tool, &call.args)?;
            let start = time::parse_instant(required(tool, "start", args.start.as_deref())?)?;
            let member_ids = args.members().unwrap_or_default();
            if member_ids.is_empty() {
                return Err(FamSyncError::InvalidToolArguments {
                    tool: tool.to_string(),
                    reason: "No memberIds provided".into(),
                });
            }
            let new = NewEvent {
                title: args.title.clone(),
                start,
                end: parse_optional_instant(args.end.as_deref())?,
                location: args.location.clone(),
                member_ids,
                recurrence: new_recurrence(
                    args.recurring_rule.as_deref(),
                    args.recurrence_end.as_deref(),
                )?,
            };
            Ok(applied_outcome(household.add_event_lasting(new, event_length)?))
        }
        UPDATE_EVENT => {
            let args: EventArgs = parse_args(tool, &call.args)?;
            let id = required(tool, "id", args.id.as_deref())?;
            let patch = event_patch(household.event(id), &args)?;
            Ok(applied_outcome(household.update_event(id, &patch)?))
        }
        DELETE_EVENT => {
            let args: IdArgs = parse_args(tool, &call.args)?;
            let id = required(tool, "id", args.id.as_deref())?;
            Ok(applied_outcome(household.delete_event(id)))
        }
        LIST_TASKS => {
            let args: ListTasksArgs = parse_args(tool, &call.args)?;
            let category = parse_category(args.category.as_deref())?;
            Ok(read_only(list_tasks(household, category, args.member_id.as_deref())))
        }
        ADD_TASK => {
            let args: TaskArgs = parse_args(tool, &call.args)?;
            let new = NewTask {
                title: args.title.clone(),
                category: parse_category(args.category.as_deref())?,
                assignee_ids: args.assignees().unwrap_or_default(),
                due_date: parse_optional_instant(args.due_date.as_deref())?,
                recurrence: new_recurrence(
                    args.recurring_rule.as_deref(),
                    args.recurrence_end.as_deref(),
                )?,
                series_id: None,
            };
            Ok(applied_outcome(household.add_task(new)?))
        }
        UPDATE_TASK => {
            let args: TaskArgs = parse_args(tool, &call.args)?;
            let id = required(tool, "id", args.id.as_deref())?;
            let patch = TaskPatch {
                title: args.title.clone(),
                category: parse_category(args.category.as_deref())?,
                assignee_ids: args.assignees(),
                due_date: parse_optional_instant(args.due_date.as_deref())?,
                is_completed: args.is_completed,
                rule: parse_rule(args.recurring_rule.as_deref())?,
                until: parse_optional_instant(args.recurrence_end.as_deref())?,
                clear_recurrence: false,
            };
            Ok(applied_outcome(household.update_task(id, &patch)?))
        }
        DELETE_TASK => {
            let args: IdArgs = parse_args(tool, &call.args)?;
            let id = required(tool, "id", args.id.as_deref())?;
            Ok(applied_outcome(household.delete_task(id)))
        }
        DISPLAY_RECOMMENDATIONS => {
            let args: RecommendationArgs = parse_args(tool, &call.args)?;
            let count = args.recommendations.len();
            board.post(turn_id, args.recommendations);
            Ok(read_only(json!({
                "status": "displayed",
                "count": count,
                "info": "Recommendations are now visible to the user as cards for confirmation."
            })))
        }
        other => Err(FamSyncError::UnknownTool(other.to_string())),
    }
}

/// Patch for `update_event`. Moving the start without an end keeps the
/// event's duration.
fn event_patch(existing: Option<&CalendarEvent>, args: &EventArgs) -> FamSyncResult<EventPatch> {
    let start = parse_optional_instant(args.start.as_deref())?;
    let mut end = parse_optional_instant(args.end.as_deref())?;

    if let (Some(start), None, Some(event)) = (start, end, existing) {
        end = Some(time::checked_shift(start, event.duration())?);
    }

    Ok(EventPatch {
        title: args.title.clone(),
        start,
        end,
        location: args.location.clone(),
        member_ids: args.members(),
        rule: parse_rule(args.recurring_rule.as_deref())?,
        until: parse_optional_instant(args.recurrence_end.as_deref())?,
        clear_recurrence: false,
    })
}

fn applied_outcome(applied: Applied) -> ToolOutcome {
    let result = effect_result(&applied.effect);
    ToolOutcome {
        household: applied.household,
        result,
    }
}

pub(crate) fn effect_result(effect: &Effect) -> Value {
    match effect {
        Effect::Created(id) | Effect::Deleted(id) => json!({ "status": "success", "id": id }),
        Effect::Updated { id, spawned } => {
            let mut result = json!({ "status": "success", "id": id });
            if let Some(next) = spawned {
                result["nextInstanceId"] = json!(next);
            }
            result
        }
        Effect::Toggled {
            id,
            completed,
            spawned,
        } => {
            let mut result = json!({ "status": "success", "id": id, "isCompleted": completed });
            if let Some(next) = spawned {
                result["nextInstanceId"] = json!(next);
            }
            result
        }
        Effect::Ignored(IgnoreReason::NotFound) => json!({
            "status": "ignored",
            "reason": "No item with that id exists."
        }),
        Effect::Ignored(IgnoreReason::VirtualOccurrence) => json!({
            "status": "ignored",
            "reason": "That id is a single occurrence of a recurring event; edit the series id instead."
        }),
    }
}

fn list_members(household: &Household) -> Value {
    let members: Vec<Value> = household
        .members
        .iter()
        .map(|m| json!({ "id": m.id, "name": m.name, "color": m.color.key() }))
        .collect();
    json!({ "status": "success", "members": members })
}

fn list_events(household: &Household, range: &DateRange, member: Option<&str>) -> Value {
    let events: Vec<Value> = visibility::visible_events(&household.events, range, member)
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "title": e.title,
                "start": time::format_instant(e.start),
                "end": time::format_instant(e.end),
                "location": e.location,
                "memberIds": e.member_ids,
                "memberNames": household.member_names(&e.member_ids),
                "recurringRule": e.recurrence.map(|r| r.rule.as_str()),
            })
        })
        .collect();

    json!({
        "status": "success",
        "start": time::format_instant(range.start),
        "end": time::format_instant(range.end),
        "events": events,
    })
}

fn list_tasks(household: &Household, category: Option<TaskCategory>, member: Option<&str>) -> Value {
    let mut tasks: Vec<ToDoTask> = household
        .tasks
        .iter()
        .filter(|t| category.is_none_or(|c| t.category == c))
        .cloned()
        .collect();
    tasks = visibility::filter_by_member(&tasks, member);
    visibility::sort_tasks(&mut tasks);

    let tasks: Vec<Value> = tasks
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "title": t.title,
                "type": t.category.as_str(),
                "isCompleted": t.is_completed,
                "dueDate": t.due_date.map(time::format_instant),
                "assigneeIds": t.assignee_ids,
                "assigneeNames": household.member_names(&t.assignee_ids),
                "seriesId": t.series_id,
                "recurringRule": t.recurrence.map(|r| r.rule.as_str()),
            })
        })
        .collect();

    json!({ "status": "success", "tasks": tasks })
}
