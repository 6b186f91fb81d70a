//! The World Bible: static content for zones, objects, NPCs, unlock rules and
//! objectives.
//!
//! Content is authored in TOML. A default bible is embedded so the game runs
//! without any external files.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

use crate::entities::{AbilityId, NpcDef, NpcId, ObjectDef, ObjectId, ObjectKind, Position, ZoneId};
use crate::error::ContentError;
use crate::progression::{Predicate, UnlockRule, UnlockTarget};
use crate::world_state::{StateQuery, WorldState};

const DEFAULT_WORLD: &str = include_str!("default_world.toml");

fn default_width() -> f32 {
    1024.0
}

fn default_height() -> f32 {
    768.0
}

fn default_spawn() -> Position {
    Position::new(100.0, 100.0)
}

/// A point that kills the player on contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub position: Position,
    pub radius: f32,
    pub cause: String,
}

/// A playable area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDef {
    pub id: ZoneId,
    pub name: String,
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default = "default_spawn")]
    pub spawn: Position,
    #[serde(default)]
    pub hazards: Vec<Hazard>,
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
}

impl ZoneDef {
    pub fn new(id: impl Into<ZoneId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            width: default_width(),
            height: default_height(),
            spawn: default_spawn(),
            hazards: Vec::new(),
            objects: Vec::new(),
        }
    }

    pub fn with_object(mut self, object: ObjectDef) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_hazard(mut self, position: Position, radius: f32, cause: impl Into<String>) -> Self {
        self.hazards.push(Hazard {
            position,
            radius,
            cause: cause.into(),
        });
        self
    }

    pub fn object(&self, id: &ObjectId) -> Option<&ObjectDef> {
        self.objects.iter().find(|object| &object.id == id)
    }

    /// NPCs placed in this zone, in authoring order.
    pub fn npc_ids(&self) -> impl Iterator<Item = &NpcId> {
        self.objects.iter().filter_map(|object| match &object.kind {
            ObjectKind::Npc { npc } => Some(npc),
            _ => None,
        })
    }
}

/// A goal shown to the player until its condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// Completed once this holds.
    pub until: Predicate,
    pub text: String,
}

impl Objective {
    pub fn new(until: Predicate, text: impl Into<String>) -> Self {
        Self {
            until,
            text: text.into(),
        }
    }
}

/// File layout of a bible. Collections are lists so authoring order is kept.
#[derive(Deserialize)]
struct BibleFile {
    start_zone: ZoneId,
    #[serde(default)]
    initial_abilities: BTreeSet<AbilityId>,
    #[serde(default)]
    zones: Vec<ZoneDef>,
    #[serde(default)]
    npcs: Vec<NpcDef>,
    #[serde(default)]
    rules: Vec<UnlockRule>,
    #[serde(default)]
    objectives: Vec<Objective>,
}

/// All static content of a world.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldBible {
    pub start_zone: ZoneId,
    pub initial_abilities: BTreeSet<AbilityId>,
    pub zones: BTreeMap<ZoneId, ZoneDef>,
    pub npcs: BTreeMap<NpcId, NpcDef>,
    /// Evaluated in this order.
    pub rules: Vec<UnlockRule>,
    /// In play order. The first one not yet completed is current.
    pub objectives: Vec<Objective>,
}

impl WorldBible {
    pub fn new(start_zone: impl Into<ZoneId>) -> Self {
        Self {
            start_zone: start_zone.into(),
            initial_abilities: BTreeSet::new(),
            zones: BTreeMap::new(),
            npcs: BTreeMap::new(),
            rules: Vec::new(),
            objectives: Vec::new(),
        }
    }

    pub fn with_zone(mut self, zone: ZoneDef) -> Self {
        self.zones.insert(zone.id.clone(), zone);
        self
    }

    pub fn with_npc(mut self, npc: NpcDef) -> Self {
        self.npcs.insert(npc.id.clone(), npc);
        self
    }

    pub fn with_rule(mut self, rule: UnlockRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_ability(mut self, ability: impl Into<AbilityId>) -> Self {
        self.initial_abilities.insert(ability.into());
        self
    }

    /// The bible compiled into the crate.
    pub fn default_bible() -> Result<Self, ContentError> {
        Self::from_toml_str(DEFAULT_WORLD)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a bible.
    pub fn from_toml_str(text: &str) -> Result<Self, ContentError> {
        let file: BibleFile = toml::from_str(text)?;

        let mut zones = BTreeMap::new();
        for zone in file.zones {
            if zones.contains_key(&zone.id) {
                return Err(ContentError::DuplicateZone(zone.id));
            }
            zones.insert(zone.id.clone(), zone);
        }

        let mut npcs = BTreeMap::new();
        for npc in file.npcs {
            if npcs.contains_key(&npc.id) {
                return Err(ContentError::DuplicateNpc(npc.id));
            }
            npcs.insert(npc.id.clone(), npc);
        }

        let bible = Self {
            start_zone: file.start_zone,
            initial_abilities: file.initial_abilities,
            zones,
            npcs,
            rules: file.rules,
            objectives: file.objectives,
        };
        bible.validate()?;

        debug!(
            zones = bible.zones.len(),
            npcs = bible.npcs.len(),
            rules = bible.rules.len(),
            objectives = bible.objectives.len(),
            "Loaded world bible"
        );
        Ok(bible)
    }

    /// Check cross references between zones, objects, NPCs and rules.
    pub fn validate(&self) -> Result<(), ContentError> {
        if !self.zones.contains_key(&self.start_zone) {
            return Err(ContentError::UnknownStartZone(self.start_zone.clone()));
        }

        let mut seen = BTreeSet::new();
        for zone in self.zones.values() {
            for object in &zone.objects {
                if !seen.insert(&object.id) {
                    return Err(ContentError::DuplicateObject(object.id.clone()));
                }
                if let ObjectKind::Npc { npc } = &object.kind {
                    self.check_npc(format!("Object {}", object.id), npc)?;
                }
                if let Some(requires) = &object.requires {
                    self.check_predicate(&format!("Object {}", object.id), requires)?;
                }
            }
        }

        for npc in self.npcs.values() {
            if npc.dialogue.is_empty() || npc.dialogue.iter().any(Vec::is_empty) {
                return Err(ContentError::EmptyDialogue(npc.id.clone()));
            }
        }

        for rule in &self.rules {
            let referrer = format!("Rule {}", rule.id);
            self.check_predicate(&referrer, &rule.when)?;
            match &rule.unlocks {
                UnlockTarget::Zone(zone) => self.check_zone(referrer, zone)?,
                UnlockTarget::NpcStage { npc, .. } => self.check_npc(referrer, npc)?,
                UnlockTarget::Ability(_) => {}
            }
        }

        for (index, objective) in self.objectives.iter().enumerate() {
            self.check_predicate(&format!("Objective {}", index + 1), &objective.until)?;
        }

        Ok(())
    }

    fn check_zone(&self, referrer: String, zone: &ZoneId) -> Result<(), ContentError> {
        if self.zones.contains_key(zone) {
            Ok(())
        } else {
            Err(ContentError::UnknownZone {
                referrer,
                zone: zone.clone(),
            })
        }
    }

    fn check_npc(&self, referrer: String, npc: &NpcId) -> Result<(), ContentError> {
        if self.npcs.contains_key(npc) {
            Ok(())
        } else {
            Err(ContentError::UnknownNpc {
                referrer,
                npc: npc.clone(),
            })
        }
    }

    fn check_predicate(&self, referrer: &str, predicate: &Predicate) -> Result<(), ContentError> {
        match predicate {
            Predicate::Zone(zone) => self.check_zone(referrer.to_owned(), zone),
            Predicate::NpcVisits { npc, .. } => self.check_npc(referrer.to_owned(), npc),
            Predicate::All(inner) | Predicate::Any(inner) => inner
                .iter()
                .try_for_each(|predicate| self.check_predicate(referrer, predicate)),
            _ => Ok(()),
        }
    }

    pub fn zone(&self, id: &ZoneId) -> Option<&ZoneDef> {
        self.zones.get(id)
    }

    pub fn npc(&self, id: &NpcId) -> Option<&NpcDef> {
        self.npcs.get(id)
    }

    /// Look an object up in any zone.
    pub fn object(&self, id: &ObjectId) -> Option<&ObjectDef> {
        self.zones.values().find_map(|zone| zone.object(id))
    }

    /// Text of the first objective whose condition does not hold yet.
    pub fn current_objective<Q: StateQuery + ?Sized>(&self, state: &Q) -> Option<&str> {
        self.objectives
            .iter()
            .find(|objective| !objective.until.holds(state))
            .map(|objective| objective.text.as_str())
    }

    /// The state a brand new world starts in.
    pub fn initial_state(&self) -> WorldState {
        let mut state = WorldState::new();
        state.unlocked_zones.insert(self.start_zone.clone());
        state.unlocked_abilities = self.initial_abilities.clone();
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FlagKey, ItemId};
    use crate::world_state::FlagValue;

    #[test]
    fn test_default_bible_loads() {
        let bible = WorldBible::default_bible().unwrap();
        assert_eq!(bible.start_zone, ZoneId::from("meadow"));
        assert!(bible.zone(&ZoneId::from("tower")).is_some());
        assert!(bible.npc(&NpcId::from("talking_tree")).is_some());
        assert!(!bible.rules.is_empty());

        let soil = bible.object(&ObjectId::from("tree_soil")).unwrap();
        assert_eq!(soil.needs_item, Some(ItemId::from("seed")));
    }

    #[test]
    fn test_initial_state_unlocks_start_zone_only() {
        let bible = WorldBible::default_bible().unwrap();
        let state = bible.initial_state();
        assert!(state.zone_unlocked(&ZoneId::from("meadow")));
        assert!(!state.zone_unlocked(&ZoneId::from("tower")));
        assert_eq!(state.lives, 0);
    }

    #[test]
    fn test_parses_objects_and_rules() {
        let bible = WorldBible::from_toml_str(
            r#"
            start_zone = "meadow"

            [[zones]]
            id = "meadow"
            name = "Meadow"
            spawn = { x = 10.0, y = 20.0 }

            [[zones.objects]]
            id = "old_key"
            kind = "item"
            item = "key"
            position = { x = 50.0, y = 60.0 }
            sets = ["key_found"]

            [[zones.objects]]
            id = "tree"
            kind = "npc"
            npc = "talking_tree"

            [[zones]]
            id = "tower"
            name = "Tower"

            [[npcs]]
            id = "talking_tree"
            name = "Talking Tree"
            dialogue = [["Hello"], ["You came back"]]

            [[rules]]
            id = "tower_opens"
            when = { flag = "key_found" }
            unlocks = { zone = "tower" }
            "#,
        )
        .unwrap();

        let meadow = bible.zone(&ZoneId::from("meadow")).unwrap();
        assert_eq!(meadow.spawn, Position::new(10.0, 20.0));
        assert_eq!(meadow.npc_ids().collect::<Vec<_>>(), vec![&NpcId::from("talking_tree")]);

        let key = meadow.object(&ObjectId::from("old_key")).unwrap();
        assert_eq!(key.kind, ObjectKind::Item { item: ItemId::from("key") });
        assert_eq!(key.position, Some(Position::new(50.0, 60.0)));

        assert_eq!(bible.rules[0].unlocks, UnlockTarget::Zone(ZoneId::from("tower")));
    }

    #[test]
    fn test_rejects_bad_references() {
        let unknown_start = WorldBible::from_toml_str(r#"start_zone = "nowhere""#);
        assert!(matches!(unknown_start, Err(ContentError::UnknownStartZone(_))));

        let bad_rule = WorldBible::from_toml_str(
            r#"
            start_zone = "meadow"
            [[zones]]
            id = "meadow"
            name = "Meadow"
            [[rules]]
            id = "broken"
            when = "always"
            unlocks = { zone = "atlantis" }
            "#,
        );
        assert!(matches!(bad_rule, Err(ContentError::UnknownZone { .. })));

        let bad_npc = WorldBible::from_toml_str(
            r#"
            start_zone = "meadow"
            [[zones]]
            id = "meadow"
            name = "Meadow"
            [[zones.objects]]
            id = "ghost"
            kind = "npc"
            npc = "nobody"
            "#,
        );
        assert!(matches!(bad_npc, Err(ContentError::UnknownNpc { .. })));
    }

    #[test]
    fn test_rejects_duplicates_and_empty_dialogue() {
        let duplicate = WorldBible::from_toml_str(
            r#"
            start_zone = "meadow"
            [[zones]]
            id = "meadow"
            name = "Meadow"
            [[zones]]
            id = "meadow"
            name = "Meadow again"
            "#,
        );
        assert!(matches!(duplicate, Err(ContentError::DuplicateZone(_))));

        let silent = WorldBible::from_toml_str(
            r#"
            start_zone = "meadow"
            [[zones]]
            id = "meadow"
            name = "Meadow"
            [[npcs]]
            id = "mute"
            name = "Mute"
            dialogue = []
            "#,
        );
        assert!(matches!(silent, Err(ContentError::EmptyDialogue(_))));
    }

    #[test]
    fn test_objectives_advance_with_state() {
        let bible = WorldBible::default_bible().unwrap();
        let mut state = bible.initial_state();
        assert_eq!(bible.current_objective(&state), Some(bible.objectives[0].text.as_str()));

        state.record_visit(&NpcId::from("talking_tree"));
        let after_talk = bible.current_objective(&state).unwrap();
        assert!(after_talk.contains("KEY"));

        state.set_flag(FlagKey::from("key_found"), FlagValue::Bool(true));
        state.set_flag(FlagKey::from("simple_door_open"), FlagValue::Bool(true));
        assert!(bible.current_objective(&state).unwrap().contains("COIN"));

        for objective in &bible.objectives {
            let mut flags = BTreeSet::new();
            objective.until.collect_flags(&mut flags);
            for flag in flags {
                state.set_flag(flag, FlagValue::Bool(true));
            }
        }
        for npc in ["friendly_fox", "wise_wizard", "mirror_twin"] {
            state.record_visit(&NpcId::from(npc));
        }
        assert_eq!(bible.current_objective(&state), None);
    }

    #[test]
    fn test_objectives_parse_and_validate() {
        let bible = WorldBible::from_toml_str(
            r#"
            start_zone = "meadow"
            [[zones]]
            id = "meadow"
            name = "Meadow"
            [[objectives]]
            until = { flag = "key_found" }
            text = "Find the key"
            "#,
        )
        .unwrap();
        assert_eq!(bible.objectives, vec![Objective::new(Predicate::flag("key_found"), "Find the key")]);

        let bad = WorldBible::from_toml_str(
            r#"
            start_zone = "meadow"
            [[zones]]
            id = "meadow"
            name = "Meadow"
            [[objectives]]
            until = { zone = "atlantis" }
            text = "Reach Atlantis"
            "#,
        );
        assert!(matches!(bad, Err(ContentError::UnknownZone { .. })));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        assert!(matches!(
            WorldBible::from_toml_str("start_zone = "),
            Err(ContentError::Parse(_))
        ));
    }
}
