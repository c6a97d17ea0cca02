//! Proposed events and tasks the agent shows but does not commit.
//!
//! Accepting a recommendation runs it through the normal add path with
//! defaults filled in, then removes it from the board.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::tools::{self, EventArgs, TaskArgs};
use crate::command::Applied;
use crate::error::{FamSyncError, FamSyncResult};
use crate::event::NewEvent;
use crate::household::Household;
use crate::member::MemberId;
use crate::task::{NewTask, TaskCategory};
use crate::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Event,
    Task,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: RecommendationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_assignee_id: Option<MemberId>,
    /// Arguments in the shape `add_event` or `add_task` takes.
    #[serde(default)]
    pub data: Value,
}

/// Recommendations grouped by the agent turn that posted them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendationBoard {
    by_turn: BTreeMap<String, Vec<Recommendation>>,
}

impl RecommendationBoard {
    /// Show `recommendations` for `turn_id`, replacing earlier ones from the
    /// same turn.
    pub fn post(&mut self, turn_id: &str, recommendations: Vec<Recommendation>) {
        self.by_turn.insert(turn_id.to_string(), recommendations);
    }

    pub fn for_turn(&self, turn_id: &str) -> &[Recommendation] {
        self.by_turn.get(turn_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every pending recommendation with its turn and index.
    pub fn pending(&self) -> impl Iterator<Item = (&str, usize, &Recommendation)> {
        self.by_turn.iter().flat_map(|(turn, recs)| {
            recs.iter()
                .enumerate()
                .map(move |(idx, rec)| (turn.as_str(), idx, rec))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.by_turn.values().all(Vec::is_empty)
    }

    pub fn dismiss(&mut self, turn_id: &str, index: usize) -> Option<Recommendation> {
        let recs = self.by_turn.get_mut(turn_id)?;
        (index < recs.len()).then(|| recs.remove(index))
    }

    /// Commit a recommendation through the add path.
    ///
    /// Events start now and last `event_length` unless the data says
    /// otherwise; tasks are due now. Without explicit ids the suggested
    /// assignee is used, then the first member. The recommendation stays on
    /// the board if the add is rejected.
    pub fn accept(
        &mut self,
        household: &Household,
        turn_id: &str,
        index: usize,
        now: Instant,
        event_length: Duration,
    ) -> FamSyncResult<Applied> {
        let rec = self
            .for_turn(turn_id)
            .get(index)
            .ok_or_else(|| {
                FamSyncError::Validation(format!("No recommendation {index} for turn {turn_id}"))
            })?
            .clone();

        let applied = match rec.category {
            RecommendationKind::Event => {
                household.add_event_lasting(event_from(&rec, household, now)?, event_length)?
            }
            RecommendationKind::Task => household.add_task(task_from(&rec, household, now)?)?,
        };

        tracing::info!(turn = %turn_id, title = %rec.title, "accepted recommendation");
        self.dismiss(turn_id, index);
        Ok(applied)
    }
}

fn default_members(rec: &Recommendation, household: &Household) -> Vec<MemberId> {
    rec.suggested_assignee_id
        .clone()
        .or_else(|| household.members.first().map(|m| m.id.clone()))
        .into_iter()
        .collect()
}

fn event_from(rec: &Recommendation, household: &Household, now: Instant) -> FamSyncResult<NewEvent> {
    let args: EventArgs = tools::parse_args(tools::ADD_EVENT, &rec.data)?;

    let start = tools::parse_optional_instant(args.start.as_deref())?.unwrap_or(now);
    let member_ids = args
        .members()
        .filter(|ids| !ids.is_empty())
        .unwrap_or_else(|| default_members(rec, household));

    Ok(NewEvent {
        title: args.title.clone().or_else(|| Some(rec.title.clone())),
        start,
        end: tools::parse_optional_instant(args.end.as_deref())?,
        location: args.location.clone(),
        member_ids,
        recurrence: tools::new_recurrence(
            args.recurring_rule.as_deref(),
            args.recurrence_end.as_deref(),
        )?,
    })
}

fn task_from(rec: &Recommendation, household: &Household, now: Instant) -> FamSyncResult<NewTask> {
    let args: TaskArgs = tools::parse_args(tools::ADD_TASK, &rec.data)?;

    let due_date = tools::parse_optional_instant(args.due_date.as_deref())?.unwrap_or(now);
    let assignee_ids = args
        .assignees()
        .filter(|ids| !ids.is_empty())
        .unwrap_or_else(|| default_members(rec, household));
    let category = match args.category.as_deref() {
        Some(c) if !c.trim().is_empty() => Some(c.parse::<TaskCategory>()?),
        _ => None,
    };

    Ok(NewTask {
        title: args.title.clone().or_else(|| Some(rec.title.clone())),
        category,
        assignee_ids,
        due_date: Some(due_date),
        recurrence: tools::new_recurrence(
            args.recurring_rule.as_deref(),
            args.recurrence_end.as_deref(),
        )?,
        series_id: None,
    })
}
