use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

use super::alerts::triggers::TriggerConfig;
use super::analysis::{PatternThresholds, TrendThresholds};
use super::contacts::model::ContactDirectory;
use super::inbox::DEFAULT_CAPACITY;
use super::model::SafeArea;

/// Monitoring settings, persisted as settings.json.
/// Every section has a default so partial files still load.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Fall, vital sign and inactivity thresholds
    #[serde(default)]
    pub triggers: TriggerConfig,
    #[serde(default)]
    pub patterns: PatternThresholds,
    #[serde(default)]
    pub trends: TrendThresholds,
    #[serde(default)]
    pub safe_area: SafeArea,
    #[serde(default)]
    pub contacts: ContactDirectory,
    /// How often the idle check runs, in seconds
    #[serde(default = "default_inactivity_check_seconds")]
    pub inactivity_check_seconds: u64,
    /// Notifications kept in memory by the monitor; oldest are dropped first
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

fn default_inactivity_check_seconds() -> u64 {
    300
}

fn default_inbox_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            triggers: TriggerConfig::default(),
            patterns: PatternThresholds::default(),
            trends: TrendThresholds::default(),
            safe_area: SafeArea::default(),
            contacts: ContactDirectory::default(),
            inactivity_check_seconds: default_inactivity_check_seconds(),
            inbox_capacity: default_inbox_capacity(),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_path: config_dir.join("settings.json"),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Loads settings, falling back to defaults when the file is missing or invalid.
    pub fn load(&self) -> Settings {
        if !self.config_path.exists() {
            log::info!("No settings at {:?}, using defaults", self.config_path);
            return Settings::default();
        }
        match fs::read_to_string(&self.config_path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Invalid settings in {:?}: {}. Using defaults", self.config_path, e);
                    Settings::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read {:?}: {}. Using defaults", self.config_path, e);
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> io::Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}
