//! Engine configuration.
//!
//! Configuration is a TOML file with `[life]`, `[storage]`, `[content]` and
//! `[logging]` sections. Every field has a default, so an empty file (or no
//! file at all) gives the standard ten second game.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub life: LifeConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.life.validate()?;
        Ok(config)
    }
}

/// What happens to the carried item when a life ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InventoryCarryover {
    /// Every life starts empty-handed.
    #[default]
    Drop,
    /// The item held at the end of a life is held at the start of the next.
    Keep,
}

/// Timing and per-life rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeConfig {
    /// Base length of a life in seconds.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: f32,

    /// Seconds added by each time crystal.
    #[serde(default = "default_crystal_bonus_secs")]
    pub crystal_bonus_secs: f32,

    /// Upper bound on bonus seconds per life. `None` is uncapped.
    #[serde(default)]
    pub crystal_bonus_cap: Option<f32>,

    #[serde(default)]
    pub carryover: InventoryCarryover,

    /// Move the next life into a zone as soon as a commit unlocks it.
    #[serde(default = "default_auto_advance")]
    pub auto_advance: bool,

    /// Tick length used by front-ends that advance time in steps.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: f32,
}

fn default_duration_secs() -> f32 {
    10.0
}

fn default_crystal_bonus_secs() -> f32 {
    10.0
}

fn default_auto_advance() -> bool {
    true
}

fn default_tick_secs() -> f32 {
    0.1
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            crystal_bonus_secs: default_crystal_bonus_secs(),
            crystal_bonus_cap: None,
            carryover: InventoryCarryover::default(),
            auto_advance: default_auto_advance(),
            tick_secs: default_tick_secs(),
        }
    }
}

impl LifeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(invalid("life.duration_secs", "must be a positive number"));
        }
        if !(self.crystal_bonus_secs.is_finite() && self.crystal_bonus_secs >= 0.0) {
            return Err(invalid("life.crystal_bonus_secs", "must not be negative"));
        }
        if let Some(cap) = self.crystal_bonus_cap {
            if !(cap.is_finite() && cap >= 0.0) {
                return Err(invalid("life.crystal_bonus_cap", "must not be negative"));
            }
        }
        if !(self.tick_secs.is_finite() && self.tick_secs > 0.0) {
            return Err(invalid("life.tick_secs", "must be a positive number"));
        }
        Ok(())
    }

    /// Seconds the next crystal grants, given what this life already received.
    pub fn crystal_grant(&self, granted_so_far: f32) -> f32 {
        match self.crystal_bonus_cap {
            Some(cap) => self.crystal_bonus_secs.min((cap - granted_so_far).max(0.0)),
            None => self.crystal_bonus_secs,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

/// Where the world state is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,
}

fn default_save_path() -> PathBuf {
    PathBuf::from("world_state.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
        }
    }
}

/// Which world bible to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// External bible file. `None` uses the embedded default world.
    #[serde(default)]
    pub bible_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber` filter directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_owned()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}
