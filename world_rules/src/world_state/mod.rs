//! World state management - the persistent structure that survives between lives.

mod store;
mod view;

pub use store::*;
pub use view::*;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::entities::{AbilityId, FlagKey, FlagWrite, ItemId, NpcId, ZoneId};
use crate::mechanics::ActionEvent;

/// Flag value types for global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    /// Named stage, e.g. `"sapling"`.
    Text(String),
}

impl FlagValue {
    /// Whether the flag counts as "set" for predicate purposes.
    pub fn is_set(&self) -> bool {
        match self {
            FlagValue::Bool(value) => *value,
            FlagValue::Int(value) => *value != 0,
            FlagValue::Text(value) => !value.is_empty(),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

/// What an NPC remembers about the player across lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NpcMemory {
    /// Number of conversations held, across all committed lives.
    pub visits: u32,
    /// Dialogue stage pointer, advanced by progression rules.
    pub stage: u32,
}

/// Read access to the state predicates are evaluated against.
///
/// Implemented by the persistent [`WorldState`] and by the per-life
/// [`ZoneView`] working copy.
pub trait StateQuery {
    fn flag(&self, key: &FlagKey) -> Option<&FlagValue>;
    fn npc_memory(&self, npc: &NpcId) -> NpcMemory;
    fn zone_unlocked(&self, zone: &ZoneId) -> bool;
    fn has_ability(&self, ability: &AbilityId) -> bool;
    fn lives(&self) -> u32;

    fn is_flag_set(&self, key: &FlagKey) -> bool {
        self.flag(key).is_some_and(FlagValue::is_set)
    }
}

/// The complete persistent state of the world between lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorldState {
    /// Global flags and variables.
    #[serde(default)]
    pub flags: BTreeMap<FlagKey, FlagValue>,

    /// NPC id -> memory of the player.
    #[serde(default)]
    pub npc_memory: BTreeMap<NpcId, NpcMemory>,

    #[serde(default)]
    pub unlocked_zones: BTreeSet<ZoneId>,

    #[serde(default)]
    pub unlocked_abilities: BTreeSet<AbilityId>,

    /// Item the next life starts with (only used by the `keep` carryover policy).
    #[serde(default)]
    pub carried_over: Option<ItemId>,

    /// Number of committed lives.
    #[serde(default)]
    pub lives: u32,

    /// Total seconds lived across committed lives.
    #[serde(default)]
    pub time_lived_secs: f64,
}

impl WorldState {
    /// Create a new empty world state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a flag, honouring the rule that a `true` flag never reverts.
    ///
    /// Returns whether the stored value changed.
    pub fn set_flag(&mut self, key: FlagKey, value: FlagValue) -> bool {
        match self.flags.get(&key) {
            Some(current) if *current == value => false,
            Some(FlagValue::Bool(true)) => {
                debug!(flag = %key, ?value, "Ignoring write over a flag that is already true");
                false
            }
            _ => {
                self.flags.insert(key, value);
                true
            }
        }
    }

    /// Apply a flag write; returns whether the stored value changed.
    pub fn apply_write(&mut self, write: &FlagWrite) -> bool {
        self.set_flag(write.key().clone(), write.value())
    }

    /// Whether a write would be a no-op against the current state.
    pub fn satisfies(&self, write: &FlagWrite) -> bool {
        self.flags.get(write.key()) == Some(&write.value())
    }

    /// Count a conversation with an NPC. Returns the new visit count.
    pub fn record_visit(&mut self, npc: &NpcId) -> u32 {
        let memory = self.npc_memory.entry(npc.clone()).or_default();
        memory.visits = memory.visits.saturating_add(1);
        memory.visits
    }

    /// Move an NPC's dialogue stage forward. Never moves it backwards.
    pub fn advance_npc_stage(&mut self, npc: &NpcId, stage: u32) -> bool {
        let memory = self.npc_memory.entry(npc.clone()).or_default();
        if memory.stage >= stage {
            return false;
        }
        memory.stage = stage;
        true
    }

    /// Fold one recorded interaction into the state.
    ///
    /// Returns the flags whose value changed.
    pub fn apply_event(&mut self, event: &ActionEvent) -> BTreeSet<FlagKey> {
        let mut changed = BTreeSet::new();
        for write in &event.writes {
            if self.apply_write(write) {
                changed.insert(write.key().clone());
            }
        }
        if let Some(npc) = event.npc() {
            self.record_visit(npc);
        }
        changed
    }
}

impl StateQuery for WorldState {
    fn flag(&self, key: &FlagKey) -> Option<&FlagValue> {
        self.flags.get(key)
    }

    fn npc_memory(&self, npc: &NpcId) -> NpcMemory {
        self.npc_memory.get(npc).copied().unwrap_or_default()
    }

    fn zone_unlocked(&self, zone: &ZoneId) -> bool {
        self.unlocked_zones.contains(zone)
    }

    fn has_ability(&self, ability: &AbilityId) -> bool {
        self.unlocked_abilities.contains(ability)
    }

    fn lives(&self) -> u32 {
        self.lives
    }
}
