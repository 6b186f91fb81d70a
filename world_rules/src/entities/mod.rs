//! Entity definitions for the game world.

mod npc;
mod object;

pub use npc::*;
pub use object::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a string-backed identifier used by authored content.
macro_rules! content_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

content_id!(
    /// Identifier of a zone (a playable area such as "meadow" or "tower").
    ZoneId
);
content_id!(
    /// Identifier of an interactable object placed in a zone.
    ObjectId
);
content_id!(
    /// Identifier of a non-player character.
    NpcId
);
content_id!(
    /// Identifier of an ability the player can unlock.
    AbilityId
);
content_id!(
    /// Key of a persistent world flag (e.g. `key_found`).
    FlagKey
);
content_id!(
    /// Kind of carriable item (e.g. `key`, `torch`, `seed`).
    ItemId
);

/// Unique identifier for a single life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LifeId(pub Uuid);

impl LifeId {
    /// Create a new random life ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a nil life ID (useful for fixtures).
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for LifeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LifeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A continuous 2D coordinate in zone space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance(&self, other: Position) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}
