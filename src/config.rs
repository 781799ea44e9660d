use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::runtime::DEFAULT_POLL_INTERVAL_MS;
use crate::theme::ThemeConfig;

/// Playback speed presets offered by the menu.
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum SpeedMode {
    #[default]
    Normal,
    Nightcore,
    Daycore,
}

impl SpeedMode {
    pub fn multiplier(&self) -> f64 {
        match self {
            SpeedMode::Normal => 1.0,
            SpeedMode::Nightcore => 1.5,
            SpeedMode::Daycore => 0.75,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SpeedMode::Normal => SpeedMode::Nightcore,
            SpeedMode::Nightcore => SpeedMode::Daycore,
            SpeedMode::Daycore => SpeedMode::Normal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub levels_dir: PathBuf,
    pub mode: SpeedMode,
    pub poll_interval_ms: u64,
    pub theme: ThemeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            levels_dir: PathBuf::from("levels"),
            mode: SpeedMode::Normal,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            theme: ThemeConfig::default(),
        }
    }
}

impl Config {
    /// Never zero, so input polling always yields.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "lyrik") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("lyrik_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
