use crate::error::{OutlineError, Result};
use crate::items::ItemState;
use crate::outline::SortType;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct OutlineSettings {
    /// Display order for freshly created lists.
    pub default_sort_type: SortType,
    /// State given to items added without an explicit state.
    pub default_item_state: ItemState,
}

pub struct SettingsStore {
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn default_store() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("app", "outline", "Outline").ok_or(OutlineError::ProjectDir)?;
        Ok(Self::new(project_dirs.config_dir().join("outline.json")))
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<OutlineSettings> {
        match fs::read_to_string(&self.config_path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(OutlineSettings::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Like [`load`](Self::load), but an unreadable or malformed file yields the
    /// defaults instead of an error.
    pub fn load_or_default(&self) -> OutlineSettings {
        self.load().unwrap_or_else(|err| {
            warn!(path = %self.config_path.display(), error = %err, "ignoring outline settings");
            OutlineSettings::default()
        })
    }

    /// Applies `change` to the stored settings and writes them back only when
    /// something actually changed.
    pub fn update(&self, change: impl FnOnce(&mut OutlineSettings)) -> Result<OutlineSettings> {
        let current = self.load()?;
        let mut next = current;
        change(&mut next);
        if next != current {
            self.save(&next)?;
            debug!(path = %self.config_path.display(), "saved outline settings");
        }
        Ok(next)
    }

    pub fn save(&self, settings: &OutlineSettings) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, serde_json::to_string_pretty(settings)?)?;
        Ok(())
    }
}
