use anyhow::Result;
use clap::Subcommand;
use famsync_core::{Color, MemberPatch};
use owo_colors::OwoColorize;

use crate::render::{Render, render_effect};
use crate::store::Store;

use super::resolve_member;

#[derive(Subcommand)]
pub enum MembersCommand {
    /// List family members
    List,
    /// Add a family member
    Add {
        name: String,

        /// Palette color (rose, blue, green, purple, orange, teal, indigo, pink, gray)
        #[arg(long)]
        color: Option<Color>,
    },
    /// Rename or recolor a member
    Update {
        /// Member id or name
        member: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        color: Option<Color>,
    },
    /// Remove a member. Their events and tasks are kept.
    Delete {
        /// Member id or name
        member: String,
    },
}

pub fn run(store: &Store, command: MembersCommand) -> Result<()> {
    let household = store.load()?;

    let (applied, target) = match command {
        MembersCommand::List => {
            if household.members.is_empty() {
                println!("{}", "No family members yet".dimmed());
            }
            for member in &household.members {
                println!("  {}", member.render(&household));
            }
            return Ok(());
        }
        MembersCommand::Add { name, color } => (household.add_member(&name, color)?, name),
        MembersCommand::Update {
            member,
            name,
            color,
        } => {
            let id = resolve_member(&household, &member)?;
            (household.update_member(&id, &MemberPatch { name, color })?, member)
        }
        MembersCommand::Delete { member } => {
            let id = resolve_member(&household, &member)?;
            (household.delete_member(&id), member)
        }
    };

    println!("{}", render_effect(&applied.effect, "member", &target));
    store.save_if_changed(&household, &applied.household)?;
    Ok(())
}
