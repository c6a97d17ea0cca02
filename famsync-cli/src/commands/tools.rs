use anyhow::{Context, Result, bail};
use famsync_core::FamSyncConfig;
use famsync_core::agent::{RecommendationBoard, ToolCall, tools};
use serde_json::Value;

use crate::store::Store;

use super::now;

/// Print the tool catalog in the shape a model API expects.
pub fn list() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&tools::catalog())?);
    Ok(())
}

/// Execute one tool call against the household and print its JSON result.
pub fn run(store: &Store, config: &FamSyncConfig, name: &str, args: Option<&str>) -> Result<()> {
    if tools::find(name).is_none() {
        bail!("Unknown tool \"{}\". Run `famsync tools` for the catalog", name);
    }

    let args: Value = match args {
        Some(raw) => serde_json::from_str(raw).context("Tool arguments must be a JSON object")?,
        None => Value::Object(Default::default()),
    };

    let household = store.load()?;
    let mut board = RecommendationBoard::default();
    let call = ToolCall::new(name, args);
    let outcome = tools::execute(&household, &call, now(), config.event_length()?, "cli", &mut board);

    println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    store.save_if_changed(&household, &outcome.household)?;
    Ok(())
}
