//! Per-zone projection of the world state handed to a life.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{FlagValue, NpcMemory, StateQuery, WorldState};
use crate::content::ZoneDef;
use crate::entities::{AbilityId, FlagKey, FlagWrite, ItemId, NpcDef, NpcId, ObjectDef, ObjectId, Position, ZoneId};

/// An object in a zone together with its persistent status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    pub def: ObjectDef,
    /// The object's permanent effect was committed in an earlier life.
    pub resolved: bool,
}

/// A copy-on-read view of the world state relevant to one zone.
///
/// A life mutates its own copy of this view; the persistent state is only
/// touched at commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneView {
    pub zone: ZoneId,
    pub name: String,
    pub spawn: Position,
    pub objects: BTreeMap<ObjectId, ObjectState>,
    pub npcs: BTreeMap<NpcId, NpcDef>,
    /// Only the flags referenced by this zone's objects.
    pub flags: BTreeMap<FlagKey, FlagValue>,
    pub npc_memory: BTreeMap<NpcId, NpcMemory>,
    pub unlocked_zones: BTreeSet<ZoneId>,
    pub abilities: BTreeSet<AbilityId>,
    pub carried_over: Option<ItemId>,
    pub lives: u32,
}

impl ZoneView {
    /// Project the state onto a zone.
    pub fn project(zone: &ZoneDef, npcs: &BTreeMap<NpcId, NpcDef>, state: &WorldState) -> Self {
        let mut referenced = BTreeSet::new();
        for object in &zone.objects {
            referenced.extend(object.sets.iter().map(|write| write.key().clone()));
            if let Some(requires) = &object.requires {
                requires.collect_flags(&mut referenced);
            }
        }

        let flags = referenced
            .into_iter()
            .filter_map(|key| state.flags.get(&key).map(|value| (key, value.clone())))
            .collect();

        let objects = zone
            .objects
            .iter()
            .map(|def| {
                let resolved = is_resolved(def, state);
                (def.id.clone(), ObjectState { def: def.clone(), resolved })
            })
            .collect();

        let zone_npcs: BTreeMap<NpcId, NpcDef> = zone
            .npc_ids()
            .filter_map(|id| npcs.get(id).map(|def| (id.clone(), def.clone())))
            .collect();

        let npc_memory = zone_npcs
            .keys()
            .map(|id| (id.clone(), state.npc_memory(id)))
            .collect();

        Self {
            zone: zone.id.clone(),
            name: zone.name.clone(),
            spawn: zone.spawn,
            objects,
            npcs: zone_npcs,
            flags,
            npc_memory,
            unlocked_zones: state.unlocked_zones.clone(),
            abilities: state.unlocked_abilities.clone(),
            carried_over: state.carried_over.clone(),
            lives: state.lives,
        }
    }

    pub fn object(&self, id: &ObjectId) -> Option<&ObjectState> {
        self.objects.get(id)
    }

    /// Apply a flag write to the working copy, with the same never-revert
    /// rule the persistent state uses.
    pub fn apply_write(&mut self, write: &FlagWrite) -> bool {
        let value = write.value();
        match self.flags.get(write.key()) {
            Some(current) if *current == value => false,
            Some(FlagValue::Bool(true)) => false,
            _ => {
                self.flags.insert(write.key().clone(), value);
                true
            }
        }
    }

    /// Count a conversation in the working copy. Returns the memory before the visit.
    pub fn record_visit(&mut self, npc: &NpcId) -> NpcMemory {
        let memory = self.npc_memory.entry(npc.clone()).or_default();
        let before = *memory;
        memory.visits = memory.visits.saturating_add(1);
        before
    }

    /// Re-check the resolved status of every object that writes one of the
    /// given flags. An object is resolved once its writes hold and it does
    /// not respawn.
    pub fn refresh_resolved(&mut self, writes: &[FlagWrite]) {
        let touched: BTreeSet<&FlagKey> = writes.iter().map(FlagWrite::key).collect();
        let flags = &self.flags;
        for object in self.objects.values_mut() {
            let def = &object.def;
            if !def.sets.iter().any(|write| touched.contains(write.key())) {
                continue;
            }
            object.resolved = !def.respawns()
                && def.sets.iter().all(|write| flags.get(write.key()) == Some(&write.value()));
        }
    }
}

/// An object is resolved when it does not respawn and every flag it writes
/// already holds the written value.
fn is_resolved(def: &ObjectDef, state: &WorldState) -> bool {
    !def.respawns() && !def.sets.is_empty() && def.sets.iter().all(|write| state.satisfies(write))
}

impl StateQuery for ZoneView {
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
        self.abilities.contains(ability)
    }

    fn lives(&self) -> u32 {
        self.lives
    }
}
