use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::stats::TimeRange;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Range preselected when the statistics screen opens
    pub default_range: TimeRange,
    /// Countdown flag given to newly created timers
    pub countdown_by_default: bool,
    pub tick_rate_ms: u64,
    /// Maximum number of points drawn on the trend chart
    pub chart_point_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_range: TimeRange::Week,
            countdown_by_default: true,
            tick_rate_ms: 100,
            chart_point_limit: 50,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;

    /// Write `after` only when it differs from what was loaded.
    /// Returns whether a write happened.
    fn save_if_changed(&self, before: &Config, after: &Config) -> std::io::Result<bool> {
        if before == after {
            return Ok(false);
        }
        self.save(after)?;
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
