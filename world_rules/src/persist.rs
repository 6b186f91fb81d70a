//! World state persistence.
//!
//! The store writes through a [`Persistence`] backend. The default backend is
//! a versioned JSON file; an in-memory backend is available for tests and
//! tools that must not touch the disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::world_state::WorldState;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid save format")]
    InvalidFormat,

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
pub const SAVE_VERSION: u32 = 1;

/// Storage for the committed world state.
pub trait Persistence {
    /// Load the saved state. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<WorldState>, PersistError>;

    /// Durably store the state. Either the whole state is written or the
    /// previous save is left intact.
    fn save(&mut self, state: &WorldState) -> Result<(), PersistError>;
}

/// On-disk layout: the state's mappings at top level plus a version tag.
#[derive(Serialize, Deserialize)]
struct SavedWorld {
    #[serde(default = "legacy_version")]
    version: u32,
    #[serde(flatten)]
    state: WorldState,
}

/// Saves written before the version tag existed.
fn legacy_version() -> u32 {
    SAVE_VERSION
}

/// JSON file backend. Saves go to a sibling temp file which is then renamed
/// over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "world_state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Persistence for JsonFileStore {
    fn load(&self) -> Result<Option<WorldState>, PersistError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let value: serde_json::Value = serde_json::from_str(&json)?;
        if !value.is_object() {
            return Err(PersistError::InvalidFormat);
        }

        let saved: SavedWorld = serde_json::from_value(value)?;
        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        debug!(path = %self.path.display(), "Loaded world state");
        Ok(Some(saved.state))
    }

    fn save(&mut self, state: &WorldState) -> Result<(), PersistError> {
        let saved = SavedWorld {
            version: SAVE_VERSION,
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&saved)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;

        debug!(path = %self.path.display(), lives = state.lives, "Saved world state");
        Ok(())
    }
}

/// Keeps the last saved state in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    saved: Option<WorldState>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start as if `state` had already been saved.
    pub fn with_saved(state: WorldState) -> Self {
        Self { saved: Some(state) }
    }

    pub fn saved(&self) -> Option<&WorldState> {
        self.saved.as_ref()
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> Result<Option<WorldState>, PersistError> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, state: &WorldState) -> Result<(), PersistError> {
        self.saved = Some(state.clone());
        Ok(())
    }
}
