use anyhow::Result;
use clap::Args;
use famsync_core::{FamSyncConfig, TaskCategory, ViewDescriptor, ViewMode, ViewSnapshot};
use owo_colors::OwoColorize;

use crate::dates::parse_when;
use crate::render::{print_events_by_day, print_tasks};
use crate::store::Store;

use super::{now, resolve_member};

#[derive(Args)]
pub struct ViewArgs {
    /// month, week or agenda; defaults to the configured view
    #[arg(long)]
    mode: Option<ViewMode>,

    /// Any day inside the period to show; defaults to today
    #[arg(long)]
    date: Option<String>,

    /// Only show this member's events and tasks (id or name)
    #[arg(long)]
    member: Option<String>,

    /// Task tab: shopping, chores or general
    #[arg(long)]
    category: Option<TaskCategory>,

    /// Periods to step forward (or back, if negative) from the date
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i32,
}

pub fn run(store: &Store, config: &FamSyncConfig, args: ViewArgs) -> Result<()> {
    let household = store.load()?;

    let anchor = match args.date.as_deref() {
        Some(d) => parse_when(d)?,
        None => now(),
    };
    let member = args
        .member
        .map(|m| resolve_member(&household, &m))
        .transpose()?;

    let view = step(
        ViewDescriptor::new(args.mode.unwrap_or(config.default_view), anchor)
            .with_week_start(config.week_start)
            .with_member(member),
        args.offset,
    );

    print_snapshot(&view.materialize(&household, args.category), &household);
    Ok(())
}

fn step(view: ViewDescriptor, offset: i32) -> ViewDescriptor {
    let mut view = view;
    for _ in 0..offset.unsigned_abs() {
        view = if offset > 0 { view.next() } else { view.previous() };
    }
    view
}

fn print_snapshot(snapshot: &ViewSnapshot, household: &famsync_core::Household) {
    println!("{}", snapshot.label.bold());
    println!();
    print_events_by_day(&snapshot.events, household);
    println!();
    println!("{}", "Tasks".bold());
    print_tasks(&snapshot.tasks, household);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    #[test]
    fn offsets_step_by_period() {
        let anchor = NaiveDate::from_ymd_opt(2026, 1, 31)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        let month = step(ViewDescriptor::new(ViewMode::Month, anchor), 1);
        assert_eq!((month.anchor.month(), month.anchor.day()), (2, 28));

        let week = step(ViewDescriptor::new(ViewMode::Week, anchor), -2);
        assert_eq!(week.anchor.date(), NaiveDate::from_ymd_opt(2026, 1, 17).unwrap());

        let same = step(ViewDescriptor::new(ViewMode::Agenda, anchor), 0);
        assert_eq!(same.anchor, anchor);
    }
}
