use anyhow::Result;
use famsync_core::FamSyncConfig;
use owo_colors::OwoColorize;

use crate::store::Store;

pub fn run(store: &Store, config: &FamSyncConfig) -> Result<()> {
    let config_path = FamSyncConfig::config_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Household:  {}", store.path().display());

    println!();
    println!("{}", "Settings".bold());
    println!("  Week starts on:          {:?}", config.week_start);
    println!("  Default view:            {}", config.default_view);
    println!("  Default event duration:  {}", config.default_event_duration);
    println!("  Agent turn limit:        {}", config.max_turns());

    Ok(())
}
