//! Progression: unlock rules and the evaluator that runs them after each commit.

mod evaluator;
mod predicate;

pub use evaluator::*;
pub use predicate::*;

use serde::{Deserialize, Serialize};

use crate::entities::{AbilityId, NpcId, ZoneId};
use crate::world_state::{StateQuery, WorldState};

/// What an unlock rule grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockTarget {
    Zone(ZoneId),
    Ability(AbilityId),
    NpcStage { npc: NpcId, stage: u32 },
}

impl UnlockTarget {
    /// Whether the state already has this unlock.
    pub fn is_unlocked_in(&self, state: &WorldState) -> bool {
        match self {
            UnlockTarget::Zone(zone) => state.zone_unlocked(zone),
            UnlockTarget::Ability(ability) => state.has_ability(ability),
            UnlockTarget::NpcStage { npc, stage } => state.npc_memory(npc).stage >= *stage,
        }
    }

    /// Grant the unlock. Never revokes anything.
    pub fn apply_to(&self, state: &mut WorldState) {
        match self {
            UnlockTarget::Zone(zone) => {
                state.unlocked_zones.insert(zone.clone());
            }
            UnlockTarget::Ability(ability) => {
                state.unlocked_abilities.insert(ability.clone());
            }
            UnlockTarget::NpcStage { npc, stage } => {
                state.advance_npc_stage(npc, *stage);
            }
        }
    }
}

impl std::fmt::Display for UnlockTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnlockTarget::Zone(zone) => write!(f, "zone {zone}"),
            UnlockTarget::Ability(ability) => write!(f, "ability {ability}"),
            UnlockTarget::NpcStage { npc, stage } => write!(f, "{npc} stage {stage}"),
        }
    }
}

/// A predicate plus the thing it gates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRule {
    pub id: String,
    pub when: Predicate,
    pub unlocks: UnlockTarget,
}

impl UnlockRule {
    pub fn new(id: impl Into<String>, when: Predicate, unlocks: UnlockTarget) -> Self {
        Self {
            id: id.into(),
            when,
            unlocks,
        }
    }
}

/// One newly granted unlock and the rule that granted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unlocked {
    pub rule: String,
    pub target: UnlockTarget,
}

/// The unlocks produced by a single commit, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UnlockDelta {
    pub unlocked: Vec<Unlocked>,
}

impl UnlockDelta {
    pub fn push(&mut self, rule: impl Into<String>, target: UnlockTarget) {
        self.unlocked.push(Unlocked {
            rule: rule.into(),
            target,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
    }

    pub fn len(&self) -> usize {
        self.unlocked.len()
    }

    pub fn zones(&self) -> impl Iterator<Item = &ZoneId> {
        self.unlocked.iter().filter_map(|u| match &u.target {
            UnlockTarget::Zone(zone) => Some(zone),
            _ => None,
        })
    }

    pub fn abilities(&self) -> impl Iterator<Item = &AbilityId> {
        self.unlocked.iter().filter_map(|u| match &u.target {
            UnlockTarget::Ability(ability) => Some(ability),
            _ => None,
        })
    }

    pub fn apply_to(&self, state: &mut WorldState) {
        for unlocked in &self.unlocked {
            unlocked.target.apply_to(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npc_stage_target() {
        let mut state = WorldState::new();
        let target = UnlockTarget::NpcStage {
            npc: NpcId::from("tree"),
            stage: 1,
        };
        assert!(!target.is_unlocked_in(&state));
        target.apply_to(&mut state);
        assert!(target.is_unlocked_in(&state));
    }

    #[test]
    fn test_delta_filters() {
        let mut delta = UnlockDelta::default();
        delta.push("a", UnlockTarget::Zone(ZoneId::from("tower")));
        delta.push("b", UnlockTarget::Ability(AbilityId::from("dash")));

        assert_eq!(delta.len(), 2);
        assert_eq!(delta.zones().collect::<Vec<_>>(), vec![&ZoneId::from("tower")]);
        assert_eq!(delta.abilities().count(), 1);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(UnlockTarget::Zone(ZoneId::from("cavern")).to_string(), "zone cavern");
    }
}
