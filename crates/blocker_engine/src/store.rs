use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use blocker_logging::blocker_debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::{write_atomic, PersistError};

/// The key-value record kept by the settings collaborator. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredSettings {
    pub block_words: Vec<String>,
    pub auto_mode: bool,
    pub blocked_count: u64,
    pub blocked_users: BTreeSet<String>,
    pub enabled: bool,
}

impl Default for StoredSettings {
    fn default() -> Self {
        Self {
            block_words: Vec::new(),
            auto_mode: false,
            blocked_count: 0,
            blocked_users: BTreeSet::new(),
            enabled: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

pub trait SettingsStore {
    fn load(&self) -> Result<StoredSettings, StoreError>;
    fn save(&mut self, settings: &StoredSettings) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    settings: StoredSettings,
}

impl MemoryStore {
    pub fn new(settings: StoredSettings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<StoredSettings, StoreError> {
        Ok(self.settings.clone())
    }

    fn save(&mut self, settings: &StoredSettings) -> Result<(), StoreError> {
        self.settings = settings.clone();
        Ok(())
    }
}

/// Settings kept in a RON file. A missing file reads as defaults.
#[derive(Debug, Clone)]
pub struct RonFileStore {
    path: PathBuf,
}

impl RonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for RonFileStore {
    fn load(&self) -> Result<StoredSettings, StoreError> {
        if !self.path.exists() {
            blocker_debug!("No settings at {}; using defaults", self.path.display());
            return Ok(StoredSettings::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        ron::from_str(&content).map_err(|err| StoreError::Parse {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    fn save(&mut self, settings: &StoredSettings) -> Result<(), StoreError> {
        let content = ron::ser::to_string_pretty(settings, ron::ser::PrettyConfig::new())
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        write_atomic(&self.path, &content)?;
        blocker_debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
