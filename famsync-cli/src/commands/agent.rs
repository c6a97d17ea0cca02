use std::path::Path;

use anyhow::{Context, Result};
use famsync_core::FamSyncConfig;
use famsync_core::agent::{AgentSession, ScriptedAssistant, StopReason};
use owo_colors::OwoColorize;

use crate::render::render_effect;
use crate::store::Store;

use super::now;

/// Run one message through the agent loop, with a recorded script standing in
/// for the model.
pub async fn run(
    store: &Store,
    config: &FamSyncConfig,
    script: &Path,
    message: &str,
    accept_all: bool,
) -> Result<()> {
    let raw = std::fs::read_to_string(script)
        .with_context(|| format!("Could not read script {}", script.display()))?;
    let mut assistant = ScriptedAssistant::from_json(&raw)?;

    let household = store.load()?;
    let mut session = AgentSession::new(household.clone(), now())
        .with_max_turns(config.max_turns())
        .with_event_length(config.event_length()?);
    let outcome = session.run(&mut assistant, message).await?;

    for turn in &session.transcript {
        if let Some(thought) = &turn.thought {
            println!("{}", thought.italic().dimmed());
        }
        for log in &turn.tool_logs {
            println!("  {} {}", format!("{}()", log.name).cyan(), log.args.to_string().dimmed());
            println!("    {}", log.result);
        }
    }

    match (&outcome.stop, &outcome.reply) {
        (StopReason::Replied, Some(reply)) => println!("\n{}", reply.bold()),
        _ => println!(
            "\n{}",
            format!("Stopped after {} turns without a reply", outcome.turns).yellow()
        ),
    }

    let pending: Vec<(String, usize, String)> = session
        .board
        .pending()
        .map(|(turn, index, rec)| (turn.to_string(), index, rec.title.clone()))
        .collect();

    if !pending.is_empty() {
        println!("\n{}", "Recommendations".bold());
        for (_, _, title) in &pending {
            println!("  - {}", title);
        }
    }

    if accept_all {
        // Last first, so removing an entry leaves the earlier indices valid.
        let now = session.now();
        let length = session.event_length();
        for (turn, index, title) in pending.iter().rev() {
            match session.board.accept(&session.household, turn, *index, now, length) {
                Ok(applied) => {
                    println!("{}", render_effect(&applied.effect, "recommendation", title));
                    session.household = applied.household;
                }
                Err(e) => eprintln!("  {}", format!("{title}: {e}").red()),
            }
        }
    }

    store.save_if_changed(&household, &session.household)?;
    Ok(())
}
