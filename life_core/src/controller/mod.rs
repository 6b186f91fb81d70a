//! The life-cycle controller: start a life, run it to its end, commit it,
//! evaluate progression, start the next one.

mod frame;

pub use frame::*;

use tracing::{error, info};

use world_rules::{LifeId, LifeRecord, ProgressionEvaluator, Resolution, WorldState, WorldStore, ZoneId, ZoneView};

use crate::config::LifeConfig;
use crate::error::ControllerError;
use crate::geometry::ZoneGeometry;
use crate::resolver::Resolver;
use crate::session::{LifeSession, LifeStatus};

/// Drives lives one after another against a single [`WorldStore`].
pub struct LifeCycleController<G: ZoneGeometry> {
    store: WorldStore,
    evaluator: ProgressionEvaluator,
    geometry: G,
    config: LifeConfig,
    resolver: Resolver,
    zone: ZoneId,
    phase: ControllerPhase,
    session: Option<LifeSession>,
    /// The record of a life whose commit failed, kept verbatim for retry.
    pending: Option<LifeRecord>,
}

impl<G: ZoneGeometry> LifeCycleController<G> {
    /// Build a controller. Unlock rules come from the store's bible.
    pub fn new(store: WorldStore, geometry: G, config: LifeConfig) -> Self {
        let evaluator = ProgressionEvaluator::from_bible(store.bible());
        let zone = store.bible().start_zone.clone();
        Self {
            store,
            evaluator,
            geometry,
            resolver: Resolver::new(config.clone()),
            config,
            zone,
            phase: ControllerPhase::Idle,
            session: None,
            pending: None,
        }
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// Zone the current (or next) life takes place in.
    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    pub fn session(&self) -> Option<&LifeSession> {
        self.session.as_ref()
    }

    pub fn store(&self) -> &WorldStore {
        &self.store
    }

    pub fn world(&self) -> &WorldState {
        self.store.state()
    }

    pub fn config(&self) -> &LifeConfig {
        &self.config
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn pending_record(&self) -> Option<&LifeRecord> {
        self.pending.as_ref()
    }

    /// Start a life in the selected zone. Does nothing if one is running.
    pub fn start_life(&mut self) -> Result<LifeId, ControllerError> {
        match self.phase {
            ControllerPhase::Halted => return Err(ControllerError::Halted),
            ControllerPhase::Running => {
                if let Some(session) = &self.session {
                    return Ok(session.id());
                }
            }
            _ => {}
        }

        let view = self.store.snapshot(&self.zone)?;
        let session = LifeSession::new(LifeId::new(), view, self.config.duration_secs);
        let id = session.id();
        info!(
            life = %id,
            zone = %self.zone,
            duration = self.config.duration_secs,
            carried = ?session.carried(),
            "Life started"
        );
        self.session = Some(session);
        self.phase = ControllerPhase::Running;
        Ok(id)
    }

    /// The first objective not yet completed in the committed world.
    pub fn objective(&self) -> Option<&str> {
        self.store.bible().current_objective(self.store.state())
    }

    /// Advance the game by one tick.
    ///
    /// Starts a life first when idle. Order within a tick: movement, hazard
    /// check, death signal, interaction, clock. A life that ends during the
    /// tick is committed before returning.
    pub fn tick(&mut self, input: TickInput) -> Result<Frame, ControllerError> {
        if self.phase == ControllerPhase::Halted {
            return Err(ControllerError::Halted);
        }
        if self.session.is_none() {
            self.start_life()?;
        }
        let objective = self.store.bible().current_objective(self.store.state()).map(str::to_owned);
        let Some(session) = self.session.as_mut() else {
            return Err(ControllerError::LifeInProgress);
        };

        let mut blocked = false;
        if let Some(target) = input.move_to {
            if self.geometry.is_walkable(&self.zone, target) {
                session.move_to(target);
            } else {
                blocked = true;
            }
        }

        if let Some(cause) = self.geometry.hazard_at(&self.zone, session.position()) {
            session.die(cause);
        }
        if let Some(cause) = input.death {
            session.die(cause);
        }

        let mut resolution: Option<Resolution> = None;
        if session.is_alive() {
            if let Some((object, action)) = &input.interact {
                let in_range = self.geometry.in_range(&self.zone, session.position(), object);
                resolution = Some(self.resolver.attempt(session, object, *action, in_range));
            }
            session.advance(input.dt);
        }

        let mut frame = Frame {
            life: session.id(),
            zone: self.zone.clone(),
            phase: self.phase,
            position: session.position(),
            time_remaining: session.timer().remaining(),
            duration: session.timer().duration(),
            carried: session.carried().cloned(),
            blocked,
            resolution,
            objective,
            summary: None,
        };

        if !session.is_alive() {
            frame.summary = Some(self.finish_life()?);
            frame.phase = self.phase;
            frame.objective = self.objective().map(str::to_owned);
        }

        Ok(frame)
    }

    /// Hand a finished session to commit.
    fn finish_life(&mut self) -> Result<LifeSummary, ControllerError> {
        let Some(session) = self.session.take() else {
            return Err(ControllerError::NothingToRetry);
        };
        self.phase = match session.status() {
            LifeStatus::Died { .. } => ControllerPhase::Died,
            _ => ControllerPhase::TimedOut,
        };
        info!(life = %session.id(), status = ?session.status(), events = session.events().len(), "Life ended");

        let Some(record) = session.into_record(self.config.carryover) else {
            self.phase = ControllerPhase::Idle;
            return Err(ControllerError::LifeInProgress);
        };
        self.commit(record)
    }

    fn commit(&mut self, record: LifeRecord) -> Result<LifeSummary, ControllerError> {
        self.phase = ControllerPhase::Committing;
        match self.evaluator.settle(&mut self.store, &record) {
            Ok(report) => {
                self.phase = ControllerPhase::Idle;
                self.pending = None;
                if self.config.auto_advance {
                    if let Some(zone) = report.unlocks.zones().last() {
                        info!(zone = %zone, "Advancing to newly unlocked zone");
                        self.zone = zone.clone();
                    }
                }
                Ok(LifeSummary {
                    life: record.life,
                    zone: record.zone,
                    ending: record.ending,
                    seconds_lived: record.seconds_lived,
                    events: record.events.len(),
                    report,
                    next_zone: self.zone.clone(),
                })
            }
            Err(err) => {
                error!(life = %record.life, %err, "Commit failed, halting");
                self.pending = Some(record);
                self.phase = ControllerPhase::Halted;
                Err(ControllerError::CommitFailed(err))
            }
        }
    }

    /// Repeat the failed commit with the identical record.
    pub fn retry_commit(&mut self) -> Result<LifeSummary, ControllerError> {
        if self.phase != ControllerPhase::Halted {
            return Err(ControllerError::NothingToRetry);
        }
        let Some(record) = self.pending.take() else {
            return Err(ControllerError::NothingToRetry);
        };
        info!(life = %record.life, "Retrying commit");
        self.commit(record)
    }

    /// Choose the zone for the next life.
    pub fn select_zone(&mut self, zone: &ZoneId) -> Result<(), ControllerError> {
        match self.phase {
            ControllerPhase::Halted => return Err(ControllerError::Halted),
            ControllerPhase::Running => return Err(ControllerError::LifeInProgress),
            _ => {}
        }
        if self.store.bible().zone(zone).is_none() {
            return Err(ControllerError::UnknownZone(zone.clone()));
        }
        if !self.store.state().unlocked_zones.contains(zone) {
            return Err(ControllerError::ZoneLocked(zone.clone()));
        }
        self.zone = zone.clone();
        Ok(())
    }

    /// Throw away the running life without committing anything.
    pub fn abandon(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        info!(life = %session.id(), "Life abandoned, nothing committed");
        if self.phase != ControllerPhase::Halted {
            self.phase = ControllerPhase::Idle;
        }
        true
    }

    /// Wipe all progress. Also clears a halted commit.
    pub fn reset_progress(&mut self) -> Result<&WorldState, ControllerError> {
        self.store.reset().map_err(ControllerError::Reset)?;
        self.session = None;
        self.pending = None;
        self.zone = self.store.bible().start_zone.clone();
        self.phase = ControllerPhase::Idle;
        Ok(self.store.state())
    }
}
