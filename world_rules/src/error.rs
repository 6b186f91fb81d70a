//! Error types for the world store and content loading.

use thiserror::Error;

use crate::entities::{LifeId, NpcId, ObjectId, ZoneId};
use crate::persist::PersistError;

/// Errors from projecting the world state onto a zone.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Zone not found: {0}")]
    ZoneNotFound(ZoneId),

    #[error("Zone is still locked: {0}")]
    ZoneLocked(ZoneId),
}

/// Errors from mutating the world state. The state is unchanged when one is returned.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Failed to persist life {life}: {source}")]
    Persist {
        life: LifeId,
        #[source]
        source: PersistError,
    },

    #[error("Failed to persist reset: {source}")]
    Reset {
        #[source]
        source: PersistError,
    },
}

/// Errors from loading or validating a world bible.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate zone: {0}")]
    DuplicateZone(ZoneId),

    #[error("Duplicate object: {0}")]
    DuplicateObject(ObjectId),

    #[error("Duplicate NPC: {0}")]
    DuplicateNpc(NpcId),

    #[error("Start zone {0} is not defined")]
    UnknownStartZone(ZoneId),

    #[error("{referrer} refers to undefined NPC {npc}")]
    UnknownNpc { referrer: String, npc: NpcId },

    #[error("{referrer} refers to undefined zone {zone}")]
    UnknownZone { referrer: String, zone: ZoneId },

    #[error("NPC {0} has no dialogue")]
    EmptyDialogue(NpcId),
}
