//! Configuration loading for tally.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.tally/config.toml`)
//! 3. User config (`~/.tally/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The tool runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TallyError};

/// Main configuration struct for tally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Roster file configuration.
    pub roster: RosterConfig,
    /// Session snapshot configuration.
    pub snapshot: SnapshotConfig,
}

/// Roster file configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RosterConfig {
    /// Path to the tab-separated roster file.
    pub path: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: "roster.txt".to_string(),
        }
    }
}

/// Session snapshot configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Directory where session snapshots are written.
    pub dir: String,
    /// Number of committed records between snapshot writes.
    pub every: u32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            every: 2,
        }
    }
}

/// Minimum valid snapshot interval (a zero interval would divide by zero).
pub const MIN_SNAPSHOT_EVERY: u32 = 1;

impl SnapshotConfig {
    /// Check if a snapshot interval is valid (must be >= 1).
    pub fn is_valid_every(value: u32) -> bool {
        value >= MIN_SNAPSHOT_EVERY
    }
}

/// Get the tally home directory.
///
/// Uses `$TALLY_HOME` if set, otherwise `~/.tally`.
pub fn tally_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("TALLY_HOME") {
        return Some(PathBuf::from(home));
    }
    dirs::home_dir().map(|home| home.join(".tally"))
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.tally/config.toml` in cwd)
    /// 3. User config (`~/.tally/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.tally/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = tally_home()?;
        let config_path = home.join("config.toml");
        Self::load_from_file(&config_path).ok()
    }

    /// Load project config from `.tally/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        let config_path = cwd.join(".tally").join("config.toml");
        Self::load_from_file(&config_path).ok()
    }

    /// Load config from a specific file path.
    fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| TallyError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| TallyError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // TALLY_ROSTER
        if let Ok(val) = env::var("TALLY_ROSTER") {
            if !val.is_empty() {
                self.roster.path = val;
            }
        }

        // TALLY_SNAPSHOT_DIR
        if let Ok(val) = env::var("TALLY_SNAPSHOT_DIR") {
            if !val.is_empty() {
                self.snapshot.dir = val;
            }
        }

        // TALLY_SNAPSHOT_EVERY
        if let Ok(val) = env::var("TALLY_SNAPSHOT_EVERY") {
            match val.parse::<u32>() {
                Ok(n) => {
                    if SnapshotConfig::is_valid_every(n) {
                        self.snapshot.every = n;
                    } else {
                        eprintln!(
                            "Warning: Invalid TALLY_SNAPSHOT_EVERY value '{}'. \
                            Must be >= {}. Using default '{}'.",
                            n, MIN_SNAPSHOT_EVERY, self.snapshot.every
                        );
                    }
                }
                Err(_) => eprintln!(
                    "Warning: Invalid TALLY_SNAPSHOT_EVERY value '{}'. \
                    Expected a positive integer. Using default '{}'.",
                    val, self.snapshot.every
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence. Non-default fields from `other`
    /// are applied to `self`, enabling layering of the precedence chain.
    /// A config cannot explicitly set a value back to the default to mask a
    /// non-default value from a lower-precedence layer.
    fn merge(mut self, other: Config) -> Self {
        let default_roster = RosterConfig::default();
        if other.roster.path != default_roster.path {
            self.roster.path = other.roster.path;
        }

        let default_snapshot = SnapshotConfig::default();
        if other.snapshot.dir != default_snapshot.dir {
            self.snapshot.dir = other.snapshot.dir;
        }
        if other.snapshot.every != default_snapshot.every {
            self.snapshot.every = other.snapshot.every;
        }

        self
    }
}
