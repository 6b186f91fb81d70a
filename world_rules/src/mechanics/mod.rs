//! Game mechanics: interaction kinds, effects, and rejection reasons.

mod event;

pub use event::*;

use serde::{Deserialize, Serialize};

use crate::entities::{ItemId, NpcId};

/// Kinds of player-initiated interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PickUp,
    Open,
    Burn,
    Plant,
    Talk,
    Activate,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::PickUp => "pick_up",
            ActionKind::Open => "open",
            ActionKind::Burn => "burn",
            ActionKind::Plant => "plant",
            ActionKind::Talk => "talk",
            ActionKind::Activate => "activate",
        }
    }

    /// Parse an action name as typed by a player or written in a script.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "pick_up" | "pickup" | "take" => Some(ActionKind::PickUp),
            "open" => Some(ActionKind::Open),
            "burn" => Some(ActionKind::Burn),
            "plant" => Some(ActionKind::Plant),
            "talk" => Some(ActionKind::Talk),
            "activate" | "press" => Some(ActionKind::Activate),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an interaction attempt did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// The life has already timed out or ended in death.
    LifeOver,
    /// The object was already interacted with this life.
    AlreadyConsumed,
    /// The life's single item slot has already been used.
    InventoryFull,
    /// A world-state requirement or carried-item requirement is not met.
    PreconditionUnmet,
    /// The player is not close enough to the object.
    OutOfRange,
    /// The object does not exist in the current zone.
    UnknownObject,
    /// The object does not respond to this kind of action.
    NotApplicable,
    /// The object's permanent effect was committed in an earlier life.
    AlreadyResolved,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::LifeOver => "LIFE_OVER",
            RejectReason::AlreadyConsumed => "ALREADY_CONSUMED",
            RejectReason::InventoryFull => "INVENTORY_FULL",
            RejectReason::PreconditionUnmet => "PRECONDITION_UNMET",
            RejectReason::OutOfRange => "OUT_OF_RANGE",
            RejectReason::UnknownObject => "UNKNOWN_OBJECT",
            RejectReason::NotApplicable => "NOT_APPLICABLE",
            RejectReason::AlreadyResolved => "ALREADY_RESOLVED",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful interaction did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    PickedUp { item: ItemId },
    /// Seconds actually added to the life (may be less than the nominal
    /// bonus when a cap is configured).
    TimeBonus { seconds: f32 },
    Opened,
    Burned,
    Planted,
    Talked { npc: NpcId, line: String },
    Activated,
}

/// Outcome of an interaction attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Applied(Effect),
    Rejected(RejectReason),
}

impl Resolution {
    pub fn is_applied(&self) -> bool {
        matches!(self, Resolution::Applied(_))
    }

    pub fn rejection(&self) -> Option<RejectReason> {
        match self {
            Resolution::Rejected(reason) => Some(*reason),
            Resolution::Applied(_) => None,
        }
    }
}
