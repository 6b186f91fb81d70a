//! The world store: sole owner and mutator of the persistent world state.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{WorldState, ZoneView};
use crate::content::WorldBible;
use crate::entities::{FlagKey, LifeId, NpcId, ZoneId};
use crate::error::{CommitError, SnapshotError};
use crate::mechanics::LifeRecord;
use crate::persist::Persistence;
use crate::progression::UnlockDelta;

/// What a successful commit changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitReport {
    pub life: LifeId,
    /// Flags whose stored value changed.
    pub changed_flags: BTreeSet<FlagKey>,
    /// Conversations added to each NPC's memory.
    pub npc_visits: BTreeMap<NpcId, u32>,
    /// Newly unlocked zones, abilities and NPC stages.
    pub unlocks: UnlockDelta,
    /// Committed lives after this commit.
    pub lives: u32,
}

/// Owns the persistent [`WorldState`] and the persistence backend it is
/// written through.
///
/// Commit is the only mutator besides [`WorldStore::reset`]. Both build the
/// next state on the side, persist it, and only then replace the current
/// state, so a failure leaves the store exactly as it was.
pub struct WorldStore {
    bible: Arc<WorldBible>,
    state: WorldState,
    initial: WorldState,
    persistence: Box<dyn Persistence>,
}

impl WorldStore {
    /// Create a store holding the bible's initial state.
    pub fn new(bible: Arc<WorldBible>, persistence: Box<dyn Persistence>) -> Self {
        let initial = bible.initial_state();
        Self {
            bible,
            state: initial.clone(),
            initial,
            persistence,
        }
    }

    /// Create a store from previously saved state, or the initial state if
    /// there is none or it cannot be read.
    pub fn open(bible: Arc<WorldBible>, persistence: Box<dyn Persistence>) -> Self {
        let mut store = Self::new(bible, persistence);
        match store.persistence.load() {
            Ok(Some(state)) => {
                info!(lives = state.lives, "Loaded saved world state");
                store.state = store.repair(state);
            }
            Ok(None) => info!("No saved world state, starting fresh"),
            Err(err) => {
                warn!(%err, "Saved world state unreadable, falling back to the initial state");
            }
        }
        store
    }

    /// Create a store with an explicit starting state (tests and tools).
    pub fn with_state(
        bible: Arc<WorldBible>,
        state: WorldState,
        persistence: Box<dyn Persistence>,
    ) -> Self {
        let mut store = Self::new(bible, persistence);
        store.state = store.repair(state);
        store
    }

    /// Saved state always keeps the start zone and initial abilities reachable.
    fn repair(&self, mut state: WorldState) -> WorldState {
        state.unlocked_zones.extend(self.initial.unlocked_zones.iter().cloned());
        state
            .unlocked_abilities
            .extend(self.initial.unlocked_abilities.iter().cloned());
        state
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn bible(&self) -> &WorldBible {
        &self.bible
    }

    pub fn bible_handle(&self) -> Arc<WorldBible> {
        Arc::clone(&self.bible)
    }

    /// Read-only projection of the state for one zone.
    pub fn snapshot(&self, zone: &ZoneId) -> Result<ZoneView, SnapshotError> {
        let def = self
            .bible
            .zone(zone)
            .ok_or_else(|| SnapshotError::ZoneNotFound(zone.clone()))?;
        if !self.state.unlocked_zones.contains(zone) {
            return Err(SnapshotError::ZoneLocked(zone.clone()));
        }
        Ok(ZoneView::project(def, &self.bible.npcs, &self.state))
    }

    /// Commit a finished life without progression evaluation.
    pub fn commit(&mut self, record: &LifeRecord) -> Result<CommitReport, CommitError> {
        self.commit_with(record, |_| UnlockDelta::default())
    }

    /// Commit a finished life atomically.
    ///
    /// `settle` runs on the staged state after the life's events are applied
    /// and returns the unlocks to fold in. Nothing is visible until the staged
    /// state has been persisted.
    pub fn commit_with<F>(&mut self, record: &LifeRecord, settle: F) -> Result<CommitReport, CommitError>
    where
        F: FnOnce(&WorldState) -> UnlockDelta,
    {
        let mut staged = self.state.clone();
        let (changed_flags, npc_visits) = stage_record(&mut staged, record);

        let unlocks = settle(&staged);
        unlocks.apply_to(&mut staged);

        self.persistence
            .save(&staged)
            .map_err(|source| CommitError::Persist {
                life: record.life,
                source,
            })?;

        self.state = staged;
        info!(
            life = %record.life,
            zone = %record.zone,
            ending = %record.ending,
            events = record.events.len(),
            changed_flags = changed_flags.len(),
            unlocks = unlocks.len(),
            "Life committed"
        );

        Ok(CommitReport {
            life: record.life,
            changed_flags,
            npc_visits,
            unlocks,
            lives: self.state.lives,
        })
    }

    /// Replace the whole state with its initial value.
    pub fn reset(&mut self) -> Result<&WorldState, CommitError> {
        self.persistence
            .save(&self.initial)
            .map_err(|source| CommitError::Reset { source })?;
        self.state = self.initial.clone();
        info!("World state reset to initial values");
        Ok(&self.state)
    }
}

/// Apply a life's log and bookkeeping to a staged state.
fn stage_record(staged: &mut WorldState, record: &LifeRecord) -> (BTreeSet<FlagKey>, BTreeMap<NpcId, u32>) {
    let mut changed = BTreeSet::new();
    let mut visits = BTreeMap::new();
    for event in &record.events {
        debug!(object = %event.object, action = %event.action, "Applying event");
        changed.extend(staged.apply_event(event));
        if let Some(npc) = event.npc() {
            *visits.entry(npc.clone()).or_insert(0) += 1;
        }
    }
    staged.lives = staged.lives.saturating_add(1);
    staged.time_lived_secs += f64::from(record.seconds_lived.max(0.0));
    staged.carried_over = record.carry_forward.clone();
    (changed, visits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ZoneDef;
    use crate::entities::{FlagWrite, ItemId, ObjectDef, ObjectId, ObjectKind};
    use crate::mechanics::{ActionEvent, ActionKind, Effect, LifeEnding};
    use crate::persist::{MemoryPersistence, PersistError};
    use crate::progression::{Predicate, UnlockRule, UnlockTarget};
    use crate::world_state::{FlagValue, StateQuery};

    struct BrokenDisk;

    impl Persistence for BrokenDisk {
        fn load(&self) -> Result<Option<WorldState>, PersistError> {
            Err(PersistError::InvalidFormat)
        }

        fn save(&mut self, _state: &WorldState) -> Result<(), PersistError> {
            Err(PersistError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }
    }

    fn bible() -> Arc<WorldBible> {
        let meadow = ZoneDef::new("meadow", "Meadow")
            .with_object(
                ObjectDef::new("old_key", ObjectKind::Item { item: ItemId::from("key") })
                    .setting("key_found"),
            )
            .with_object(ObjectDef::new("tree_soil", ObjectKind::Planter).setting("seed_planted"));
        let tower = ZoneDef::new("tower", "Tower");
        Arc::new(
            WorldBible::new("meadow")
                .with_zone(meadow)
                .with_zone(tower)
                .with_rule(UnlockRule::new(
                    "tower_opens",
                    Predicate::flag("key_found"),
                    UnlockTarget::Zone(ZoneId::from("tower")),
                )),
        )
    }

    fn key_event() -> ActionEvent {
        ActionEvent {
            object: ObjectId::from("old_key"),
            action: ActionKind::PickUp,
            effect: Effect::PickedUp { item: ItemId::from("key") },
            writes: vec![FlagWrite::Set(FlagKey::from("key_found"))],
            used_item: None,
        }
    }

    #[test]
    fn test_commit_applies_events_and_bookkeeping() {
        let mut store = WorldStore::new(bible(), Box::new(MemoryPersistence::new()));
        let record = LifeRecord::empty("meadow", LifeEnding::TimedOut, 10.0).with_event(key_event());

        let report = store.commit(&record).unwrap();

        assert!(report.changed_flags.contains(&FlagKey::from("key_found")));
        assert!(report.unlocks.is_empty());
        assert_eq!(store.state().lives, 1);
        assert!((store.state().time_lived_secs - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_failed_persist_leaves_state_untouched() {
        let mut store = WorldStore::new(bible(), Box::new(BrokenDisk));
        let before = store.state().clone();
        let record = LifeRecord::empty("meadow", LifeEnding::TimedOut, 10.0).with_event(key_event());

        let err = store.commit(&record).unwrap_err();

        assert!(matches!(err, CommitError::Persist { .. }));
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_snapshot_rejects_unknown_and_locked_zones() {
        let store = WorldStore::new(bible(), Box::new(MemoryPersistence::new()));

        assert!(matches!(
            store.snapshot(&ZoneId::from("nowhere")),
            Err(SnapshotError::ZoneNotFound(_))
        ));
        assert!(matches!(
            store.snapshot(&ZoneId::from("tower")),
            Err(SnapshotError::ZoneLocked(_))
        ));
        assert!(store.snapshot(&ZoneId::from("meadow")).is_ok());
    }

    #[test]
    fn test_commit_with_applies_unlocks() {
        let mut store = WorldStore::new(bible(), Box::new(MemoryPersistence::new()));
        let record = LifeRecord::empty("meadow", LifeEnding::TimedOut, 4.0).with_event(key_event());
        let rule_target = UnlockTarget::Zone(ZoneId::from("tower"));

        let report = store
            .commit_with(&record, |staged| {
                let mut delta = UnlockDelta::default();
                if staged.is_flag_set(&FlagKey::from("key_found")) {
                    delta.push("tower_opens", rule_target.clone());
                }
                delta
            })
            .unwrap();

        assert_eq!(report.unlocks.zones().count(), 1);
        assert!(store.state().zone_unlocked(&ZoneId::from("tower")));
        assert!(store.snapshot(&ZoneId::from("tower")).is_ok());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut store = WorldStore::new(bible(), Box::new(MemoryPersistence::new()));
        let record = LifeRecord::empty("meadow", LifeEnding::TimedOut, 10.0).with_event(key_event());
        store.commit(&record).unwrap();

        let state = store.reset().unwrap();

        assert!(state.flags.is_empty());
        assert_eq!(state.lives, 0);
        assert!(state.zone_unlocked(&ZoneId::from("meadow")));
    }

    #[test]
    fn test_open_falls_back_when_save_is_unreadable() {
        let store = WorldStore::open(bible(), Box::new(BrokenDisk));
        assert_eq!(store.state(), &bible().initial_state());
    }

    #[test]
    fn test_open_restores_saved_state() {
        let mut saved = bible().initial_state();
        saved.set_flag(FlagKey::from("seed_planted"), FlagValue::Bool(true));
        saved.lives = 3;

        let store = WorldStore::open(bible(), Box::new(MemoryPersistence::with_saved(saved.clone())));
        assert_eq!(store.state(), &saved);
    }

    #[test]
    fn test_commit_is_deterministic() {
        let record = LifeRecord::empty("meadow", LifeEnding::Died { cause: "spikes".into() }, 3.5)
            .with_event(key_event());

        let mut first = WorldStore::new(bible(), Box::new(MemoryPersistence::new()));
        let mut second = WorldStore::new(bible(), Box::new(MemoryPersistence::new()));
        let a = first.commit(&record).unwrap();
        let b = second.commit(&record).unwrap();

        assert_eq!(a, b);
        assert_eq!(first.state(), second.state());
    }
}
