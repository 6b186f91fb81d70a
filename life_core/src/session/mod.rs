//! A single life: the working copy of the world, the clock, the player and
//! the log of what happened.

mod timer;

pub use timer::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use world_rules::{
    ActionEvent, ActionKind, ItemId, LifeEnding, LifeId, LifeRecord, ObjectId, Position, RejectReason, ZoneView,
};

use crate::config::InventoryCarryover;

/// Where a life is in its short existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LifeStatus {
    Alive,
    TimedOut,
    Died { cause: String },
}

/// An attempt that did nothing. Kept for display, never committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub object: ObjectId,
    pub action: ActionKind,
    pub reason: RejectReason,
}

/// One bounded episode of play.
///
/// Owns its [`ZoneView`] and its log. Nothing here is visible to the world
/// until the finished session is turned into a [`LifeRecord`] and committed.
#[derive(Debug, Clone)]
pub struct LifeSession {
    pub(crate) id: LifeId,
    pub(crate) view: ZoneView,
    pub(crate) timer: LifeTimer,
    pub(crate) position: Position,
    pub(crate) carried: Option<ItemId>,
    /// The single item pick-up of this life has happened (or the life began
    /// holding a carried-over item).
    pub(crate) slot_used: bool,
    /// Object id -> consumed this life.
    pub(crate) interactions: BTreeMap<ObjectId, bool>,
    pub(crate) log: Vec<ActionEvent>,
    pub(crate) rejections: Vec<Rejection>,
    pub(crate) status: LifeStatus,
}

impl LifeSession {
    /// Start a life in the given view. The player spawns at the zone's spawn
    /// point holding whatever was carried over.
    pub fn new(id: LifeId, view: ZoneView, duration: f32) -> Self {
        let carried = view.carried_over.clone();
        Self {
            id,
            position: view.spawn,
            slot_used: carried.is_some(),
            carried,
            view,
            timer: LifeTimer::new(duration),
            interactions: BTreeMap::new(),
            log: Vec::new(),
            rejections: Vec::new(),
            status: LifeStatus::Alive,
        }
    }

    pub fn id(&self) -> LifeId {
        self.id
    }

    pub fn view(&self) -> &ZoneView {
        &self.view
    }

    pub fn timer(&self) -> &LifeTimer {
        &self.timer
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn carried(&self) -> Option<&ItemId> {
        self.carried.as_ref()
    }

    pub fn events(&self) -> &[ActionEvent] {
        &self.log
    }

    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    pub fn status(&self) -> &LifeStatus {
        &self.status
    }

    pub fn is_alive(&self) -> bool {
        self.status == LifeStatus::Alive
    }

    pub fn is_consumed(&self, object: &ObjectId) -> bool {
        self.interactions.get(object).copied().unwrap_or(false)
    }

    /// Move the player. The caller has already checked walkability.
    pub fn move_to(&mut self, position: Position) {
        if self.is_alive() {
            self.position = position;
        }
    }

    /// Advance the clock, ending the life when it runs out.
    pub fn advance(&mut self, dt: f32) -> &LifeStatus {
        if self.is_alive() && self.timer.advance(dt) {
            debug!(life = %self.id, elapsed = self.timer.elapsed(), "Life timed out");
            self.status = LifeStatus::TimedOut;
        }
        &self.status
    }

    /// End the life by death. Ignored once the life is already over.
    pub fn die(&mut self, cause: impl Into<String>) {
        if self.is_alive() {
            let cause = cause.into();
            debug!(life = %self.id, %cause, "Life ended by death");
            self.status = LifeStatus::Died { cause };
        }
    }

    /// Turn a finished life into its commit record. `None` while still alive.
    pub fn into_record(self, carryover: InventoryCarryover) -> Option<LifeRecord> {
        let ending = match self.status {
            LifeStatus::Alive => return None,
            LifeStatus::TimedOut => LifeEnding::TimedOut,
            LifeStatus::Died { cause } => LifeEnding::Died { cause },
        };
        let carry_forward = match carryover {
            InventoryCarryover::Drop => None,
            InventoryCarryover::Keep => self.carried,
        };
        Some(LifeRecord {
            life: self.id,
            zone: self.view.zone,
            ending,
            events: self.log,
            seconds_lived: self.timer.elapsed(),
            carry_forward,
        })
    }
}
