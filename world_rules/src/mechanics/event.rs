//! Records produced by a life and consumed by commit.

use serde::{Deserialize, Serialize};

use super::{ActionKind, Effect};
use crate::entities::{FlagWrite, ItemId, LifeId, NpcId, ObjectId, ZoneId};

/// A successful interaction, recorded in the life's log.
///
/// Carries every flag write it implies so that committing a log never has to
/// consult content again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub object: ObjectId,
    pub action: ActionKind,
    pub effect: Effect,
    #[serde(default)]
    pub writes: Vec<FlagWrite>,
    /// Carried item used up by this interaction.
    #[serde(default)]
    pub used_item: Option<ItemId>,
}

impl ActionEvent {
    /// NPC whose memory this event advances, if any.
    pub fn npc(&self) -> Option<&NpcId> {
        match &self.effect {
            Effect::Talked { npc, .. } => Some(npc),
            _ => None,
        }
    }
}

/// How a life ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ending", rename_all = "snake_case")]
pub enum LifeEnding {
    TimedOut,
    Died { cause: String },
}

impl std::fmt::Display for LifeEnding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifeEnding::TimedOut => f.write_str("timed out"),
            LifeEnding::Died { cause } => write!(f, "died ({cause})"),
        }
    }
}

/// Everything a finished life hands to commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeRecord {
    pub life: LifeId,
    pub zone: ZoneId,
    pub ending: LifeEnding,
    /// Successful interactions in the order they happened.
    pub events: Vec<ActionEvent>,
    pub seconds_lived: f32,
    /// Item the next life starts with, as decided by the carryover policy.
    #[serde(default)]
    pub carry_forward: Option<ItemId>,
}

impl LifeRecord {
    /// A record with no events, handy for lives that only ran out the clock.
    pub fn empty(zone: impl Into<ZoneId>, ending: LifeEnding, seconds_lived: f32) -> Self {
        Self {
            life: LifeId::new(),
            zone: zone.into(),
            ending,
            events: Vec::new(),
            seconds_lived,
            carry_forward: None,
        }
    }

    pub fn with_event(mut self, event: ActionEvent) -> Self {
        self.events.push(event);
        self
    }
}
