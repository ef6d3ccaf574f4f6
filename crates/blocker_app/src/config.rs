use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use blocker_core::Timings;
use blocker_engine::SurfaceProfile;
use blocker_logging::blocker_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Settle windows in milliseconds, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingsConfig {
    pub menu_settle_ms: u64,
    pub confirm_settle_ms: u64,
    pub success_grace_ms: u64,
    pub failure_backoff_ms: u64,
    /// `None` waits for a manual confirmation without limit.
    pub manual_confirm_deadline_ms: Option<u64>,
}

impl Default for TimingsConfig {
    fn default() -> Self {
        let defaults = Timings::default();
        Self {
            menu_settle_ms: millis(defaults.menu_settle),
            confirm_settle_ms: millis(defaults.confirm_settle),
            success_grace_ms: millis(defaults.success_grace),
            failure_backoff_ms: millis(defaults.failure_backoff),
            manual_confirm_deadline_ms: defaults.manual_confirm_deadline.map(millis),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl From<&TimingsConfig> for Timings {
    fn from(config: &TimingsConfig) -> Self {
        Timings {
            menu_settle: Duration::from_millis(config.menu_settle_ms),
            confirm_settle: Duration::from_millis(config.confirm_settle_ms),
            success_grace: Duration::from_millis(config.success_grace_ms),
            failure_backoff: Duration::from_millis(config.failure_backoff_ms),
            manual_confirm_deadline: config.manual_confirm_deadline_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub profile: SurfaceProfile,
    pub timings: TimingsConfig,
    /// Settings store file (block words, mode, counters).
    pub settings_path: PathBuf,
    pub sync_interval_secs: u64,
    /// Also log to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            profile: SurfaceProfile::default(),
            timings: TimingsConfig::default(),
            settings_path: PathBuf::from("blocker_settings.ron"),
            sync_interval_secs: 30,
            log_file: None,
        }
    }
}

impl RunnerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        blocker_info!("Loaded runner config from {:?}", path);
        Ok(config)
    }

    pub fn timings(&self) -> Timings {
        Timings::from(&self.timings)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }
}
