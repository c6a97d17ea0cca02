//! Recurrence rules and occurrence expansion.
//!
//! Occurrences are derived on demand from an anchor (the stored event) and a
//! window; they are never stored. Each occurrence of a recurring anchor gets a
//! synthesized id `{anchor_id}_inst_{step}` that is stable for the same inputs
//! and only meaningful within one expansion.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months};
use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::error::FamSyncError;
use crate::event::CalendarEvent;
use crate::time::{self, Instant};

/// Upper bound on walked steps per anchor and expansion.
pub const MAX_OCCURRENCES: usize = 365;

/// Marks a synthesized occurrence id.
pub const INSTANCE_MARKER: &str = "_inst_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceRule {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrenceRule {
    /// Step one period forward from `t`. `None` once the result would leave
    /// the supported years.
    pub fn advance(self, t: Instant) -> Option<Instant> {
        let next = match self {
            RecurrenceRule::Daily => t.checked_add_days(Days::new(1)),
            RecurrenceRule::Weekly => t.checked_add_days(Days::new(7)),
            RecurrenceRule::Monthly => t.checked_add_months(Months::new(1)),
        };
        next.filter(|n| time::in_supported_years(*n))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceRule::Daily => "daily",
            RecurrenceRule::Weekly => "weekly",
            RecurrenceRule::Monthly => "monthly",
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecurrenceRule {
    type Err = FamSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(RecurrenceRule::Daily),
            "weekly" => Ok(RecurrenceRule::Weekly),
            "monthly" => Ok(RecurrenceRule::Monthly),
            other => Err(FamSyncError::Validation(format!(
                "Unknown recurrence rule '{other}'. Expected daily, weekly or monthly"
            ))),
        }
    }
}

/// A rule plus an optional inclusive end of recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    pub rule: RecurrenceRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<Instant>,
}

impl RecurrenceSpec {
    pub fn new(rule: RecurrenceRule, until: Option<Instant>) -> Self {
        RecurrenceSpec { rule, until }
    }

    /// Whether a step starting at `t` is still inside the recurrence.
    pub fn allows(&self, t: Instant) -> bool {
        self.until.is_none_or(|until| t <= until)
    }
}

/// Combine an existing recurrence with partial changes.
///
/// `clear` wins over everything else. A new `rule` creates or replaces the
/// spec (keeping the old `until` unless a new one is given). An `until` on
/// its own only applies to an already recurring entity.
pub fn merge_recurrence(
    existing: Option<RecurrenceSpec>,
    rule: Option<RecurrenceRule>,
    until: Option<Instant>,
    clear: bool,
) -> Option<RecurrenceSpec> {
    if clear {
        return None;
    }

    match (existing, rule) {
        (_, Some(rule)) => Some(RecurrenceSpec {
            rule,
            until: until.or(existing.and_then(|r| r.until)),
        }),
        (Some(spec), None) => Some(RecurrenceSpec {
            until: until.or(spec.until),
            ..spec
        }),
        (None, None) => None,
    }
}

/// One concrete occurrence produced by [`expand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// Step number counted from the anchor, including steps before the window.
    pub step: usize,
    pub start: Instant,
    pub end: Instant,
}

/// Expand an anchor `[start, end]` into the occurrences visible in `range`.
///
/// Without a recurrence the anchor itself is returned when its start or end
/// falls inside the range. With one, the walk starts at the anchor and steps
/// one period at a time, keeping the anchor's duration, until it passes
/// `until`, passes the end of the range, or hits [`MAX_OCCURRENCES`] steps.
/// Steps that start before the range are walked but not emitted.
pub fn expand(
    start: Instant,
    end: Instant,
    recurrence: Option<&RecurrenceSpec>,
    range: &DateRange,
) -> Vec<Occurrence> {
    let Some(spec) = recurrence else {
        return if range.touches(start, end) {
            vec![Occurrence { step: 0, start, end }]
        } else {
            Vec::new()
        };
    };

    let duration = end - start;
    let mut occurrences = Vec::new();
    let mut current = start;

    for step in 0..MAX_OCCURRENCES {
        if !spec.allows(current) || current > range.end {
            break;
        }

        if current >= range.start {
            let Some(end) = current.checked_add_signed(duration) else {
                break;
            };
            occurrences.push(Occurrence {
                step,
                start: current,
                end,
            });
        }

        match spec.rule.advance(current) {
            Some(next) => current = next,
            None => break,
        }
    }

    occurrences
}

/// Synthesized id for the `step`-th occurrence of an anchor.
pub fn instance_id(anchor_id: &str, step: usize) -> String {
    format!("{anchor_id}{INSTANCE_MARKER}{step}")
}

/// True for ids produced by [`instance_id`].
pub fn is_virtual_id(id: &str) -> bool {
    id.contains(INSTANCE_MARKER)
}

/// Strip the occurrence suffix, returning the anchor id.
pub fn anchor_id(id: &str) -> &str {
    match id.find(INSTANCE_MARKER) {
        Some(pos) => &id[..pos],
        None => id,
    }
}

/// Expand every event in `events` into the occurrences visible in `range`.
///
/// Non-recurring events keep their own id; occurrences of recurring events
/// carry a synthesized id and otherwise copy the anchor.
pub fn expand_events(events: &[CalendarEvent], range: &DateRange) -> Vec<CalendarEvent> {
    let mut expanded = Vec::new();

    for event in events {
        let occurrences = expand(event.start, event.end, event.recurrence.as_ref(), range);

        if event.recurrence.is_none() {
            expanded.extend(occurrences.into_iter().map(|_| event.clone()));
            continue;
        }

        if occurrences.len() == MAX_OCCURRENCES {
            tracing::debug!(event = %event.id, "recurrence expansion hit the step cap");
        }

        expanded.extend(occurrences.into_iter().map(|occ| CalendarEvent {
            id: instance_id(&event.id, occ.step),
            start: occ.start,
            end: occ.end,
            ..event.clone()
        }));
    }

    expanded
}
