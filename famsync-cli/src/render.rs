//! Colored terminal rendering for famsync types.

use chrono::NaiveDate;
use famsync_core::command::{Effect, IgnoreReason};
use famsync_core::recurrence;
use famsync_core::{CalendarEvent, Household, Member, ToDoTask};
use owo_colors::OwoColorize;

use crate::commands::now;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self, household: &Household) -> String;
}

/// A member's name in their own color.
pub fn member_label(member: &Member) -> String {
    let (r, g, b) = hex_rgb(member.hex());
    member.name.truecolor(r, g, b).bold().to_string()
}

fn hex_rgb(hex: &str) -> (u8, u8, u8) {
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(128)
    };
    (channel(1), channel(3), channel(5))
}

fn names(household: &Household, ids: &[String]) -> String {
    let labels: Vec<String> = ids
        .iter()
        .map(|id| match household.member(id) {
            Some(m) => member_label(m),
            None => household.member_name(id).dimmed().to_string(),
        })
        .collect();
    labels.join(", ")
}

impl Render for Member {
    fn render(&self, _household: &Household) -> String {
        format!(
            "{} {} {}",
            member_label(self),
            format!("({})", self.color).dimmed(),
            self.id.dimmed()
        )
    }
}

impl Render for CalendarEvent {
    fn render(&self, household: &Household) -> String {
        let time = format!("{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"));
        let mut line = format!("{:>11} {}", time, self.title);

        if let Some(location) = &self.location {
            line.push_str(&format!(" @ {}", location).dimmed().to_string());
        }
        if let Some(spec) = &self.recurrence {
            line.push_str(&format!(" ({})", spec.rule).cyan().to_string());
        }
        if !self.member_ids.is_empty() {
            line.push_str(&format!("  {}", names(household, &self.member_ids)));
        }
        line.push_str(&format!("  {}", self.id.dimmed()));
        line
    }
}

impl Render for ToDoTask {
    fn render(&self, household: &Household) -> String {
        let check = if self.is_completed {
            "[x]".green().to_string()
        } else {
            "[ ]".to_string()
        };
        let title = if self.is_completed {
            self.title.strikethrough().dimmed().to_string()
        } else {
            self.title.clone()
        };

        let mut line = format!("{} {} {}", check, title, format!("[{}]", self.category).dimmed());

        if let Some(due) = self.due_date {
            let due_label = format!("due {}", format_date_label(due.date(), today()));
            if !self.is_completed && due < famsync_core::time::start_of_day(now()) {
                line.push_str(&format!(" {}", due_label.red()));
            } else {
                line.push_str(&format!(" {}", due_label.dimmed()));
            }
        }
        if let Some(spec) = &self.recurrence {
            line.push_str(&format!(" ({})", spec.rule).cyan().to_string());
        }
        line.push_str(&format!("  {}", names(household, &self.assignee_ids)));
        line.push_str(&format!("  {}", self.id.dimmed()));
        line
    }
}

fn today() -> NaiveDate {
    now().date()
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Print events grouped under a heading per day.
pub fn print_events_by_day(events: &[CalendarEvent], household: &Household) {
    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return;
    }

    let mut current_date: Option<NaiveDate> = None;
    for event in events {
        let date = event.start.date();
        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", format_date_label(date, today()).bold());
            current_date = Some(date);
        }
        println!("  {}", event.render(household));
    }
}

pub fn print_tasks(tasks: &[ToDoTask], household: &Household) {
    if tasks.is_empty() {
        println!("{}", "No tasks".dimmed());
        return;
    }
    for task in tasks {
        println!("  {}", task.render(household));
    }
}

/// One-line summary of a command's effect.
pub fn render_effect(effect: &Effect, noun: &str, id: &str) -> String {
    match effect {
        Effect::Created(new_id) => format!("  Created {noun}: {new_id}").green().to_string(),
        Effect::Updated { id, spawned } => {
            let mut line = format!("  Updated {noun}: {id}").yellow().to_string();
            if let Some(next) = spawned {
                line.push_str(&format!("\n  Next in series: {next}").green().to_string());
            }
            line
        }
        Effect::Deleted(id) => format!("  Deleted {noun}: {id}").red().to_string(),
        Effect::Toggled {
            id,
            completed,
            spawned,
        } => {
            let state = if *completed { "done" } else { "not done" };
            let mut line = format!("  Marked {state}: {id}").green().to_string();
            if let Some(next) = spawned {
                line.push_str(&format!("\n  Next in series: {next}").green().to_string());
            }
            line
        }
        Effect::Ignored(IgnoreReason::NotFound) => {
            format!("  No {noun} with id {id}").yellow().to_string()
        }
        Effect::Ignored(IgnoreReason::VirtualOccurrence) => format!(
            "  {id} is one occurrence of a recurring {noun}; edit {} to change the series",
            recurrence::anchor_id(id)
        )
        .yellow()
        .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_labels() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 24).unwrap();
        assert_eq!(format_date_label(today, today), "Today");
        assert_eq!(format_date_label(today.succ_opt().unwrap(), today), "Tomorrow");
        assert_eq!(
            format_date_label(NaiveDate::from_ymd_opt(2026, 2, 25).unwrap(), NaiveDate::from_ymd_opt(2026, 2, 20).unwrap()),
            "Wed Feb 25"
        );
    }

    #[test]
    fn hex_channels() {
        assert_eq!(hex_rgb("#fb7185"), (0xfb, 0x71, 0x85));
        assert_eq!(hex_rgb("oops"), (128, 128, 128));
    }

    #[test]
    fn virtual_effect_names_the_series() {
        let line = render_effect(
            &Effect::Ignored(IgnoreReason::VirtualOccurrence),
            "event",
            "abc_inst_3",
        );
        assert!(line.contains("edit abc"));
    }
}
