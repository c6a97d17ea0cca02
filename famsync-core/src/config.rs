//! Global famsync configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{FamSyncError, FamSyncResult};
use crate::time::WeekStart;
use crate::view::ViewMode;

static DEFAULT_DATA_FILE: &str = "~/.famsync/household.json";
static DEFAULT_EVENT_DURATION: &str = "1h";

/// Upper bound on model turns per agent request.
pub const MAX_AGENT_TURNS: usize = 8;

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn default_event_duration() -> String {
    DEFAULT_EVENT_DURATION.to_string()
}

fn default_agent_max_turns() -> usize {
    MAX_AGENT_TURNS
}

/// Configuration at ~/.config/famsync/config.toml
///
/// Every key can be overridden with a `FAMSYNC_` environment variable,
/// e.g. `FAMSYNC_WEEK_START=monday`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FamSyncConfig {
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    #[serde(default)]
    pub week_start: WeekStart,

    #[serde(default)]
    pub default_view: ViewMode,

    #[serde(default = "default_event_duration")]
    pub default_event_duration: String,

    #[serde(default = "default_agent_max_turns")]
    pub agent_max_turns: usize,
}

impl Default for FamSyncConfig {
    fn default() -> Self {
        FamSyncConfig {
            data_file: default_data_file(),
            week_start: WeekStart::default(),
            default_view: ViewMode::default(),
            default_event_duration: default_event_duration(),
            agent_max_turns: default_agent_max_turns(),
        }
    }
}

impl FamSyncConfig {
    pub fn config_path() -> FamSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FamSyncError::Config("Could not determine config directory".into()))?
            .join("famsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, writing a commented-out default on first run.
    pub fn load() -> FamSyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> FamSyncResult<Self> {
        let config: FamSyncConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("FAMSYNC").try_parsing(true))
            .build()
            .map_err(|e| FamSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| FamSyncError::Config(e.to_string()))?;

        // Validate eagerly so a typo fails at startup.
        config.event_duration()?;

        Ok(config)
    }

    /// Data file path with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_file.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn event_duration(&self) -> FamSyncResult<Duration> {
        humantime::parse_duration(&self.default_event_duration).map_err(|e| {
            FamSyncError::Config(format!(
                "Invalid default_event_duration '{}': {e}",
                self.default_event_duration
            ))
        })
    }

    /// The default event length as a calendar offset.
    pub fn event_length(&self) -> FamSyncResult<chrono::Duration> {
        chrono::Duration::from_std(self.event_duration()?).map_err(|_| {
            FamSyncError::Config(format!(
                "default_event_duration '{}' is too large",
                self.default_event_duration
            ))
        })
    }

    pub fn max_turns(&self) -> usize {
        self.agent_max_turns.clamp(1, MAX_AGENT_TURNS)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> FamSyncResult<()> {
        let contents = format!(
            "\
# famsync configuration

# Where the household (members, events, tasks) is stored:
# data_file = \"{DEFAULT_DATA_FILE}\"

# First day of the week (sunday or monday):
# week_start = \"sunday\"

# View shown by `famsync view` (month, week or agenda):
# default_view = \"week\"

# Length of events created without an end time:
# default_event_duration = \"{DEFAULT_EVENT_DURATION}\"

# Model turns allowed per agent request (1-{MAX_AGENT_TURNS}):
# agent_max_turns = {MAX_AGENT_TURNS}
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FamSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| FamSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
