use anyhow::Result;
use clap::Subcommand;
use famsync_core::recurrence::RecurrenceSpec;
use famsync_core::visibility;
use famsync_core::{DateRange, EventPatch, FamSyncConfig, Instant, NewEvent, time};

use crate::dates::{parse_end, parse_when};
use crate::render::{print_events_by_day, render_effect};
use crate::store::Store;

use super::{now, parse_rule, resolve_member, resolve_members};

#[derive(Subcommand)]
pub enum EventsCommand {
    /// List events, recurring series expanded
    List {
        /// Start date (e.g. "2026-03-01", "monday"); defaults to today
        #[arg(long)]
        from: Option<String>,

        /// End date; defaults to a week after the start
        #[arg(long)]
        to: Option<String>,

        /// Only events involving this member (id or name)
        #[arg(long)]
        member: Option<String>,
    },
    /// Create an event
    Add {
        title: String,

        /// Start (e.g. "tomorrow 3pm", "2026-03-20T15:00")
        #[arg(long)]
        start: String,

        /// End date/time (conflicts with --duration)
        #[arg(long, conflicts_with = "duration")]
        end: Option<String>,

        /// Duration (e.g. "30m", "2h")
        #[arg(long)]
        duration: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Member id or name; repeat for several
        #[arg(long = "member")]
        members: Vec<String>,

        /// daily, weekly or monthly
        #[arg(long)]
        repeat: Option<String>,

        /// Last day of the repetition
        #[arg(long, requires = "repeat")]
        until: Option<String>,
    },
    /// Change an event series. Occurrence ids (`<id>_inst_<n>`) are rejected.
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        start: Option<String>,

        /// End date/time, or a duration from the (new) start
        #[arg(long)]
        end: Option<String>,

        /// Empty string clears the location
        #[arg(long)]
        location: Option<String>,

        /// Replace the members; repeat for several
        #[arg(long = "member")]
        members: Vec<String>,

        #[arg(long, conflicts_with = "no_repeat")]
        repeat: Option<String>,

        #[arg(long, conflicts_with = "no_repeat")]
        until: Option<String>,

        /// Stop repeating
        #[arg(long)]
        no_repeat: bool,
    },
    Delete {
        id: String,
    },
    /// Move an event to a new start, keeping its duration
    Move {
        id: String,

        #[arg(long)]
        to: String,
    },
}

pub fn run(store: &Store, config: &FamSyncConfig, command: EventsCommand) -> Result<()> {
    let household = store.load()?;

    let (applied, id) = match command {
        EventsCommand::List { from, to, member } => {
            let range = list_range(from.as_deref(), to.as_deref(), now())?;
            let member = member
                .map(|m| resolve_member(&household, &m))
                .transpose()?;
            let events = visibility::visible_events(&household.events, &range, member.as_deref());
            print_events_by_day(&events, &household);
            return Ok(());
        }
        EventsCommand::Add {
            title,
            start,
            end,
            duration,
            location,
            members,
            repeat,
            until,
        } => {
            let start = parse_when(&start)?;
            let end = match (end, duration) {
                (Some(end), _) => parse_end(&end, start)?,
                (None, Some(d)) => parse_end(&d, start)?,
                (None, None) => time::checked_shift(start, config.event_length()?)?,
            };

            let new = NewEvent {
                title: Some(title),
                end: Some(end),
                location,
                member_ids: resolve_members(&household, &members)?,
                recurrence: recurrence(repeat.as_deref(), until.as_deref())?,
                ..NewEvent::at(start)
            };
            (household.add_event(new)?, String::new())
        }
        EventsCommand::Update {
            id,
            title,
            start,
            end,
            location,
            members,
            repeat,
            until,
            no_repeat,
        } => {
            let start = start.as_deref().map(parse_when).transpose()?;
            let end_base = start
                .or_else(|| household.event(&id).map(|e| e.start))
                .unwrap_or_else(now);

            let patch = EventPatch {
                title,
                start,
                end: end.map(|e| parse_end(&e, end_base)).transpose()?,
                location,
                member_ids: if members.is_empty() {
                    None
                } else {
                    Some(resolve_members(&household, &members)?)
                },
                rule: repeat.as_deref().map(parse_rule).transpose()?,
                until: until.as_deref().map(parse_when).transpose()?.map(time::end_of_day),
                clear_recurrence: no_repeat,
            };
            (household.update_event(&id, &patch)?, id)
        }
        EventsCommand::Delete { id } => (household.delete_event(&id), id),
        EventsCommand::Move { id, to } => {
            let new_start = parse_when(&to)?;
            (household.drop_event(&id, new_start)?, id)
        }
    };

    println!("{}", render_effect(&applied.effect, "event", &id));
    store.save_if_changed(&household, &applied.household)?;
    Ok(())
}

fn list_range(from: Option<&str>, to: Option<&str>, now: Instant) -> Result<DateRange> {
    let start = match from {
        Some(s) => parse_when(s)?,
        None => time::start_of_day(now),
    };
    let end = match to {
        Some(s) => time::end_of_day(parse_when(s)?),
        None => time::checked_shift(
            start,
            chrono::Duration::days(famsync_core::date_range::DEFAULT_LISTING_DAYS),
        )?,
    };
    if end < start {
        anyhow::bail!("--to is before --from");
    }
    Ok(DateRange::new(start, end))
}

fn recurrence(repeat: Option<&str>, until: Option<&str>) -> Result<Option<RecurrenceSpec>> {
    let Some(rule) = repeat else {
        return Ok(None);
    };
    let until = until.map(parse_when).transpose()?.map(time::end_of_day);
    Ok(Some(RecurrenceSpec::new(parse_rule(rule)?, until)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use famsync_core::RecurrenceRule;

    fn noon() -> Instant {
        NaiveDate::from_ymd_opt(2026, 3, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn default_list_range_is_a_week_from_today() {
        let range = list_range(None, None, noon()).unwrap();
        assert_eq!(range.start, time::start_of_day(noon()));
        assert_eq!((range.end - range.start).num_days(), 7);
    }

    #[test]
    fn list_range_end_covers_the_whole_day() {
        let range = list_range(Some("2026-03-20"), Some("2026-03-21"), noon()).unwrap();
        assert_eq!(range.end, time::end_of_day(noon() + chrono::Duration::days(1)));
        assert!(list_range(Some("2026-03-21"), Some("2026-03-20"), noon()).is_err());
    }

    #[test]
    fn repeat_until_runs_through_that_day() {
        let spec = recurrence(Some("weekly"), Some("2026-04-30")).unwrap().unwrap();
        assert_eq!(spec.rule, RecurrenceRule::Weekly);
        assert_eq!(spec.until.unwrap().date(), NaiveDate::from_ymd_opt(2026, 4, 30).unwrap());
        assert!(recurrence(None, None).unwrap().is_none());
        assert!(recurrence(Some("yearly"), None).is_err());
    }
}
