//! The household JSON file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use famsync_core::Household;

pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: PathBuf) -> Self {
        Store { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the household; a missing file is an empty household.
    pub fn load(&self) -> Result<Household> {
        if !self.path.exists() {
            return Ok(Household::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Could not parse {}", self.path.display()))
    }

    /// Write the household through a temp file and rename, so a crash never
    /// leaves a half-written file behind.
    pub fn save(&self, household: &Household) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        let content = serde_json::to_string_pretty(household)?;
        std::fs::write(&temp, content)
            .with_context(|| format!("Could not write {}", temp.display()))?;
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(e).with_context(|| {
                format!("Could not move {} to {}", temp.display(), self.path.display())
            });
        }

        tracing::debug!(path = %self.path.display(), "saved household");
        Ok(())
    }

    /// Save `after` unless it equals `before`. Returns whether it wrote.
    pub fn save_if_changed(&self, before: &Household, after: &Household) -> Result<bool> {
        if before == after {
            return Ok(false);
        }
        self.save(after)?;
        Ok(true)
    }
}
