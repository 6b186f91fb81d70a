//! Predicates over world state, shared by unlock rules and object requirements.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::entities::{AbilityId, FlagKey, NpcId, ZoneId};
use crate::world_state::{FlagValue, StateQuery};

/// A pure condition over world state.
///
/// In content files predicates are written as inline tables, e.g.
/// `{ all = [{ flag = "door_open" }, { flag = "vine_burned" }] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Always,
    /// The flag is set (true, non-zero, or non-empty).
    Flag(FlagKey),
    FlagEquals { flag: FlagKey, value: FlagValue },
    NpcVisits { npc: NpcId, at_least: u32 },
    Zone(ZoneId),
    Ability(AbilityId),
    Lives { at_least: u32 },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn flag(key: impl Into<FlagKey>) -> Self {
        Predicate::Flag(key.into())
    }

    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::All(predicates.into_iter().collect())
    }

    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Any(predicates.into_iter().collect())
    }

    /// Evaluate against any state that can answer queries.
    pub fn holds<Q: StateQuery + ?Sized>(&self, state: &Q) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Flag(key) => state.is_flag_set(key),
            Predicate::FlagEquals { flag, value } => state.flag(flag) == Some(value),
            Predicate::NpcVisits { npc, at_least } => state.npc_memory(npc).visits >= *at_least,
            Predicate::Zone(zone) => state.zone_unlocked(zone),
            Predicate::Ability(ability) => state.has_ability(ability),
            Predicate::Lives { at_least } => state.lives() >= *at_least,
            Predicate::All(predicates) => predicates.iter().all(|p| p.holds(state)),
            Predicate::Any(predicates) => predicates.iter().any(|p| p.holds(state)),
        }
    }

    /// Collect every flag key the predicate reads.
    pub fn collect_flags(&self, out: &mut BTreeSet<FlagKey>) {
        match self {
            Predicate::Flag(key) | Predicate::FlagEquals { flag: key, .. } => {
                out.insert(key.clone());
            }
            Predicate::All(predicates) | Predicate::Any(predicates) => {
                for predicate in predicates {
                    predicate.collect_flags(out);
                }
            }
            _ => {}
        }
    }
}
