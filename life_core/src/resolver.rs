//! Interaction resolution.
//!
//! The resolver decides whether a player's attempt on an object applies, and
//! if it does, records the event and updates the session's working copy.

use tracing::debug;

use world_rules::{ActionEvent, ActionKind, Effect, ObjectDef, ObjectId, ObjectKind, RejectReason, Resolution};

use crate::config::LifeConfig;
use crate::session::{LifeSession, Rejection};

/// Validates and applies interaction attempts against a [`LifeSession`].
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: LifeConfig,
}

impl Resolver {
    pub fn new(config: LifeConfig) -> Self {
        Self { config }
    }

    /// Attempt `action` on `object`.
    ///
    /// `in_range` comes from the geometry collaborator. Rejections are
    /// recorded on the session and never touch its working copy. A life
    /// that has already ended rejects everything.
    pub fn attempt(
        &self,
        session: &mut LifeSession,
        object: &ObjectId,
        action: ActionKind,
        in_range: bool,
    ) -> Resolution {
        match self.check(session, object, action, in_range) {
            Ok(def) => Resolution::Applied(self.apply(session, def, action)),
            Err(reason) => {
                debug!(life = %session.id, %object, %action, %reason, "Interaction rejected");
                session.rejections.push(Rejection {
                    object: object.clone(),
                    action,
                    reason,
                });
                Resolution::Rejected(reason)
            }
        }
    }

    fn check(
        &self,
        session: &LifeSession,
        object: &ObjectId,
        action: ActionKind,
        in_range: bool,
    ) -> Result<ObjectDef, RejectReason> {
        if !session.is_alive() {
            return Err(RejectReason::LifeOver);
        }
        let state = session.view.object(object).ok_or(RejectReason::UnknownObject)?;
        if !in_range {
            return Err(RejectReason::OutOfRange);
        }
        if session.is_consumed(object) {
            return Err(RejectReason::AlreadyConsumed);
        }
        if !state.def.kind.accepts(action) {
            return Err(RejectReason::NotApplicable);
        }
        if state.resolved {
            return Err(RejectReason::AlreadyResolved);
        }
        if matches!(state.def.kind, ObjectKind::Item { .. }) && session.slot_used {
            return Err(RejectReason::InventoryFull);
        }

        let requirement_met = state
            .def
            .requires
            .as_ref()
            .map_or(true, |predicate| predicate.holds(&session.view));
        let item_met = state
            .def
            .needs_item
            .as_ref()
            .map_or(true, |item| session.carried.as_ref() == Some(item));
        if !(requirement_met && item_met) {
            return Err(RejectReason::PreconditionUnmet);
        }

        Ok(state.def.clone())
    }

    fn apply(&self, session: &mut LifeSession, def: ObjectDef, action: ActionKind) -> Effect {
        let object = def.id.clone();
        let used_item = if def.consumes_item() {
            session.carried.take()
        } else {
            None
        };

        let effect = match &def.kind {
            ObjectKind::Item { item } => {
                session.carried = Some(item.clone());
                session.slot_used = true;
                Effect::PickedUp { item: item.clone() }
            }
            ObjectKind::TimeCrystal => {
                let seconds = self.config.crystal_grant(session.timer.bonus_granted());
                session.timer.extend(seconds);
                Effect::TimeBonus { seconds }
            }
            ObjectKind::Door => Effect::Opened,
            ObjectKind::Vine => Effect::Burned,
            ObjectKind::Planter => Effect::Planted,
            ObjectKind::Switch => Effect::Activated,
            ObjectKind::Npc { npc } => {
                let memory = session.view.record_visit(npc);
                let line = session
                    .view
                    .npcs
                    .get(npc)
                    .map_or_else(|| format!("Hello, I'm {npc}!"), |def| def.line(&memory));
                Effect::Talked {
                    npc: npc.clone(),
                    line,
                }
            }
        };

        for write in &def.sets {
            session.view.apply_write(write);
        }
        session.view.refresh_resolved(&def.sets);
        session.interactions.insert(object.clone(), true);

        debug!(life = %session.id, %object, %action, ?effect, "Interaction applied");
        session.log.push(ActionEvent {
            object,
            action,
            effect: effect.clone(),
            writes: def.sets,
            used_item,
        });

        effect
    }
}
