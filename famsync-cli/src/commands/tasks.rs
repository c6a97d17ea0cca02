use anyhow::{Result, bail};
use clap::Subcommand;
use famsync_core::recurrence::RecurrenceSpec;
use famsync_core::{FamSyncConfig, NewTask, TaskCategory, TaskPatch, ViewDescriptor, ViewMode};
use famsync_core::{series, time, visibility};
use owo_colors::OwoColorize;

use crate::dates::parse_when;
use crate::render::{print_tasks, render_effect};
use crate::store::Store;

use super::{now, parse_rule, resolve_member, resolve_members};

#[derive(Subcommand)]
pub enum TasksCommand {
    /// Tasks due this week, plus anything overdue and unfinished
    List {
        /// shopping, chores or general
        #[arg(long)]
        category: Option<TaskCategory>,

        /// Only tasks assigned to this member (id or name)
        #[arg(long)]
        member: Option<String>,

        /// Every task, completed history included
        #[arg(long)]
        all: bool,
    },
    Add {
        title: String,

        #[arg(long)]
        category: Option<TaskCategory>,

        /// Member id or name; repeat for several
        #[arg(long = "assignee", required = true)]
        assignees: Vec<String>,

        /// Due date (e.g. "friday", "2026-03-20")
        #[arg(long)]
        due: Option<String>,

        /// daily, weekly or monthly
        #[arg(long, requires = "due")]
        repeat: Option<String>,

        #[arg(long, requires = "repeat")]
        until: Option<String>,
    },
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        category: Option<TaskCategory>,

        /// Replace the assignees; repeat for several
        #[arg(long = "assignee")]
        assignees: Vec<String>,

        #[arg(long)]
        due: Option<String>,

        /// Mark done; a recurring task gets its next instance
        #[arg(long, conflicts_with = "undone")]
        done: bool,

        #[arg(long)]
        undone: bool,

        #[arg(long, conflicts_with = "no_repeat")]
        repeat: Option<String>,

        #[arg(long, conflicts_with = "no_repeat")]
        until: Option<String>,

        #[arg(long)]
        no_repeat: bool,
    },
    Delete {
        id: String,
    },
    /// Flip a task between done and not done
    Toggle {
        id: String,
    },
    /// Every instance of a task's series, latest due date first
    History {
        id: String,
    },
}

pub fn run(store: &Store, config: &FamSyncConfig, command: TasksCommand) -> Result<()> {
    let household = store.load()?;

    let (applied, id) = match command {
        TasksCommand::List {
            category,
            member,
            all,
        } => {
            let member = member
                .map(|m| resolve_member(&household, &m))
                .transpose()?;

            let tasks = if all {
                let mut tasks: Vec<_> = visibility::filter_by_member(&household.tasks, member.as_deref())
                    .into_iter()
                    .filter(|t| category.is_none_or(|c| t.category == c))
                    .collect();
                visibility::sort_tasks(&mut tasks);
                tasks
            } else {
                let view = ViewDescriptor::new(ViewMode::Week, now()).with_week_start(config.week_start);
                println!("{}", view.label().bold());
                visibility::task_list(&household.tasks, &view.task_range(), category, member.as_deref())
            };
            print_tasks(&tasks, &household);
            return Ok(());
        }
        TasksCommand::History { id } => {
            let Some(task) = household.task(&id) else {
                bail!("No task with id {}", id);
            };
            let history = series::history(&household.tasks, task.series_key());
            print_tasks(&history, &household);
            return Ok(());
        }
        TasksCommand::Add {
            title,
            category,
            assignees,
            due,
            repeat,
            until,
        } => {
            let due_date = due.as_deref().map(parse_when).transpose()?;
            let recurrence = match repeat {
                Some(rule) => {
                    let until = until.as_deref().map(parse_when).transpose()?.map(time::end_of_day);
                    Some(RecurrenceSpec::new(parse_rule(&rule)?, until))
                }
                None => None,
            };

            let new = NewTask {
                title: Some(title),
                category,
                assignee_ids: resolve_members(&household, &assignees)?,
                due_date,
                recurrence,
                ..NewTask::default()
            };
            (household.add_task(new)?, String::new())
        }
        TasksCommand::Update {
            id,
            title,
            category,
            assignees,
            due,
            done,
            undone,
            repeat,
            until,
            no_repeat,
        } => {
            let patch = TaskPatch {
                title,
                category,
                assignee_ids: if assignees.is_empty() {
                    None
                } else {
                    Some(resolve_members(&household, &assignees)?)
                },
                due_date: due.as_deref().map(parse_when).transpose()?,
                is_completed: completion(done, undone),
                rule: repeat.as_deref().map(parse_rule).transpose()?,
                until: until.as_deref().map(parse_when).transpose()?.map(time::end_of_day),
                clear_recurrence: no_repeat,
            };
            (household.update_task(&id, &patch)?, id)
        }
        TasksCommand::Delete { id } => (household.delete_task(&id), id),
        TasksCommand::Toggle { id } => (household.toggle_task(&id), id),
    };

    println!("{}", render_effect(&applied.effect, "task", &id));
    store.save_if_changed(&household, &applied.household)?;
    Ok(())
}

fn completion(done: bool, undone: bool) -> Option<bool> {
    match (done, undone) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_flags() {
        assert_eq!(completion(true, false), Some(true));
        assert_eq!(completion(false, true), Some(false));
        assert_eq!(completion(false, false), None);
    }
}
