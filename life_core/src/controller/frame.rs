//! Per-tick input and output of the controller.

use serde::{Deserialize, Serialize};

use world_rules::{ActionKind, CommitReport, ItemId, LifeEnding, LifeId, ObjectId, Position, Resolution, ZoneId};

/// Life-cycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerPhase {
    Idle,
    Running,
    TimedOut,
    Died,
    Committing,
    /// A commit failed. No new life starts until it is retried or progress is reset.
    Halted,
}

/// What the presentation layer feeds the controller each tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickInput {
    /// Seconds since the previous tick.
    pub dt: f32,
    pub move_to: Option<Position>,
    pub interact: Option<(ObjectId, ActionKind)>,
    /// Death signalled by the presentation layer.
    pub death: Option<String>,
}

impl TickInput {
    pub fn wait(dt: f32) -> Self {
        Self {
            dt,
            ..Self::default()
        }
    }

    pub fn moving_to(mut self, position: Position) -> Self {
        self.move_to = Some(position);
        self
    }

    pub fn interacting(mut self, object: impl Into<ObjectId>, action: ActionKind) -> Self {
        self.interact = Some((object.into(), action));
        self
    }

    pub fn dying(mut self, cause: impl Into<String>) -> Self {
        self.death = Some(cause.into());
        self
    }
}

/// How a life ended and what its commit did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeSummary {
    pub life: LifeId,
    pub zone: ZoneId,
    pub ending: LifeEnding,
    pub seconds_lived: f32,
    pub events: usize,
    pub report: CommitReport,
    /// Zone the next life starts in.
    pub next_zone: ZoneId,
}

/// What the presentation layer renders after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub life: LifeId,
    pub zone: ZoneId,
    pub phase: ControllerPhase,
    pub position: Position,
    pub time_remaining: f32,
    pub duration: f32,
    pub carried: Option<ItemId>,
    /// Requested movement was refused by the geometry.
    pub blocked: bool,
    pub resolution: Option<Resolution>,
    /// Current goal from the committed world. `None` once every objective is done.
    pub objective: Option<String>,
    /// Present on the tick a life ended.
    pub summary: Option<LifeSummary>,
}
