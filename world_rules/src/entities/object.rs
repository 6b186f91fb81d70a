//! Interactable object definitions.

use serde::{Deserialize, Serialize};

use super::{FlagKey, ItemId, NpcId, ObjectId, Position};
use crate::mechanics::ActionKind;
use crate::progression::Predicate;
use crate::world_state::FlagValue;

/// What an object is, and therefore which single action it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectKind {
    /// A carriable item. Picking it up fills the life's only item slot.
    Item { item: ItemId },
    /// Extends the current life's duration. Never carried.
    TimeCrystal,
    Door,
    Vine,
    /// A spot where a seed can be planted.
    Planter,
    Npc { npc: NpcId },
    Switch,
}

impl ObjectKind {
    /// The action this kind of object responds to.
    pub fn action(&self) -> ActionKind {
        match self {
            ObjectKind::Item { .. } | ObjectKind::TimeCrystal => ActionKind::PickUp,
            ObjectKind::Door => ActionKind::Open,
            ObjectKind::Vine => ActionKind::Burn,
            ObjectKind::Planter => ActionKind::Plant,
            ObjectKind::Npc { .. } => ActionKind::Talk,
            ObjectKind::Switch => ActionKind::Activate,
        }
    }

    /// Check whether the object accepts the given action.
    pub fn accepts(&self, action: ActionKind) -> bool {
        self.action() == action
    }

    /// Whether objects of this kind come back every life by default.
    pub fn respawns_by_default(&self) -> bool {
        matches!(
            self,
            ObjectKind::Item { .. } | ObjectKind::TimeCrystal | ObjectKind::Npc { .. }
        )
    }
}

/// A flag mutation performed when an interaction is applied.
///
/// In content files a bare string sets the flag to `true`; a table sets an
/// explicit value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagWrite {
    Set(FlagKey),
    Value { flag: FlagKey, value: FlagValue },
}

impl FlagWrite {
    pub fn key(&self) -> &FlagKey {
        match self {
            FlagWrite::Set(key) => key,
            FlagWrite::Value { flag, .. } => flag,
        }
    }

    pub fn value(&self) -> FlagValue {
        match self {
            FlagWrite::Set(_) => FlagValue::Bool(true),
            FlagWrite::Value { value, .. } => value.clone(),
        }
    }
}

/// A single interactable object as authored in the world bible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    pub id: ObjectId,

    #[serde(flatten)]
    pub kind: ObjectKind,

    /// Where the object sits. Only geometry collaborators read this.
    #[serde(default)]
    pub position: Option<Position>,

    /// World-state condition that must hold for the interaction to apply.
    #[serde(default)]
    pub requires: Option<Predicate>,

    /// Item that must be carried for the interaction to apply.
    #[serde(default)]
    pub needs_item: Option<ItemId>,

    /// Whether the needed item is used up. Defaults to `true` when an item is needed.
    #[serde(default)]
    pub consumes_item: Option<bool>,

    /// Flags written when the interaction applies.
    #[serde(default)]
    pub sets: Vec<FlagWrite>,

    /// Overrides the per-kind respawn default.
    #[serde(default)]
    pub respawns: Option<bool>,
}

impl ObjectDef {
    /// Create an object with no requirements and no flag writes.
    pub fn new(id: impl Into<ObjectId>, kind: ObjectKind) -> Self {
        Self {
            id: id.into(),
            kind,
            position: None,
            requires: None,
            needs_item: None,
            consumes_item: None,
            sets: Vec::new(),
            respawns: None,
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn requiring(mut self, predicate: Predicate) -> Self {
        self.requires = Some(predicate);
        self
    }

    pub fn needing(mut self, item: impl Into<ItemId>) -> Self {
        self.needs_item = Some(item.into());
        self
    }

    pub fn setting(mut self, flag: impl Into<FlagKey>) -> Self {
        self.sets.push(FlagWrite::Set(flag.into()));
        self
    }

    pub fn with_respawn(mut self, respawns: bool) -> Self {
        self.respawns = Some(respawns);
        self
    }

    pub fn respawns(&self) -> bool {
        self.respawns.unwrap_or_else(|| self.kind.respawns_by_default())
    }

    pub fn consumes_item(&self) -> bool {
        self.needs_item.is_some() && self.consumes_item.unwrap_or(true)
    }
}
