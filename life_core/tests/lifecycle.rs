//! End-to-end runs of the life loop against the default world.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use life_core::{
    ControllerError, ControllerPhase, Frame, LifeConfig, LifeCycleController, OpenGround, TickInput, ZoneGeometry,
};
use tempfile::TempDir;
use world_rules::{
    ActionKind, Effect, FlagKey, ItemId, JsonFileStore, MemoryPersistence, NpcId, ObjectId, PersistError,
    Persistence, Position, RejectReason, Resolution, StateQuery, WorldBible, WorldState, WorldStore, ZoneId,
};

fn bible() -> Arc<WorldBible> {
    Arc::new(WorldBible::default_bible().unwrap())
}

fn controller_with(store: WorldStore, config: LifeConfig) -> LifeCycleController<OpenGround> {
    let geometry = OpenGround::new(store.bible_handle());
    LifeCycleController::new(store, geometry, config)
}

fn fresh() -> LifeCycleController<OpenGround> {
    controller_with(
        WorldStore::new(bible(), Box::new(MemoryPersistence::new())),
        LifeConfig::default(),
    )
}

fn act(controller: &mut LifeCycleController<impl ZoneGeometry>, object: &str, action: ActionKind) -> Resolution {
    controller
        .tick(TickInput::wait(0.1).interacting(object, action))
        .unwrap()
        .resolution
        .unwrap()
}

/// Let the clock run out and return the final frame.
fn run_out(controller: &mut LifeCycleController<impl ZoneGeometry>) -> Frame {
    loop {
        let frame = controller.tick(TickInput::wait(1.0)).unwrap();
        if frame.summary.is_some() {
            return frame;
        }
    }
}

#[test]
fn scenario_planted_seed_is_visible_next_life() {
    let mut controller = fresh();

    assert!(act(&mut controller, "seed", ActionKind::PickUp).is_applied());
    assert_eq!(act(&mut controller, "tree_soil", ActionKind::Plant), Resolution::Applied(Effect::Planted));
    run_out(&mut controller);

    assert!(controller.world().is_flag_set(&FlagKey::from("seed_planted")));

    controller.start_life().unwrap();
    let session = controller.session().unwrap();
    assert!(session.view().is_flag_set(&FlagKey::from("seed_planted")));
    assert!(session.view().object(&ObjectId::from("tree_soil")).unwrap().resolved);
    // the tree remembers
    assert_eq!(session.view().npc_memory(&NpcId::from("talking_tree")).stage, 1);
}

#[test]
fn scenario_key_from_earlier_life_opens_tower_door() {
    let mut controller = fresh();

    assert!(act(&mut controller, "old_key", ActionKind::PickUp).is_applied());
    let summary = run_out(&mut controller).summary.unwrap();
    assert_eq!(summary.next_zone, ZoneId::from("tower"));

    assert_eq!(act(&mut controller, "tower_door", ActionKind::Open), Resolution::Applied(Effect::Opened));
}

#[test]
fn scenario_tower_door_stays_shut_without_committed_key() {
    let mut state = bible().initial_state();
    state.unlocked_zones.insert(ZoneId::from("tower"));
    let store = WorldStore::with_state(bible(), state, Box::new(MemoryPersistence::new()));
    let mut controller = controller_with(store, LifeConfig::default());
    controller.select_zone(&ZoneId::from("tower")).unwrap();

    assert_eq!(
        act(&mut controller, "tower_door", ActionKind::Open),
        Resolution::Rejected(RejectReason::PreconditionUnmet)
    );
}

#[test]
fn scenario_second_pick_up_is_rejected() {
    let mut controller = fresh();

    act(&mut controller, "seed", ActionKind::PickUp);
    let world_before = controller.world().clone();
    let view_before = controller.session().unwrap().view().clone();

    let second = act(&mut controller, "old_key", ActionKind::PickUp);

    assert_eq!(second, Resolution::Rejected(RejectReason::InventoryFull));
    assert_eq!(controller.world(), &world_before);
    let session = controller.session().unwrap();
    assert_eq!(session.view(), &view_before);
    assert_eq!(session.carried(), Some(&ItemId::from("seed")));
}

#[test]
fn scenario_time_crystal_extends_life() {
    let mut controller = fresh();

    let frame = controller
        .tick(TickInput::wait(4.0).interacting("meadow_crystal", ActionKind::PickUp))
        .unwrap();
    assert_eq!(frame.resolution, Some(Resolution::Applied(Effect::TimeBonus { seconds: 10.0 })));
    assert_eq!(frame.duration, 20.0);

    let frame = controller.tick(TickInput::wait(15.5)).unwrap();
    assert!(frame.summary.is_none());
    assert_eq!(frame.phase, ControllerPhase::Running);

    let frame = controller.tick(TickInput::wait(0.5)).unwrap();
    let summary = frame.summary.unwrap();
    assert_eq!(summary.seconds_lived, 20.0);
}

#[test]
fn crystal_cap_limits_bonus_per_life() {
    let store = WorldStore::new(bible(), Box::new(MemoryPersistence::new()));
    let mut controller = controller_with(
        store,
        LifeConfig {
            crystal_bonus_cap: Some(4.0),
            ..LifeConfig::default()
        },
    );

    let bonus = act(&mut controller, "meadow_crystal", ActionKind::PickUp);
    assert_eq!(bonus, Resolution::Applied(Effect::TimeBonus { seconds: 4.0 }));
    assert_eq!(controller.session().unwrap().timer().duration(), 14.0);
}

#[test]
fn abandoned_life_leaves_world_untouched() {
    let mut controller = fresh();
    let before = controller.world().clone();

    act(&mut controller, "seed", ActionKind::PickUp);
    act(&mut controller, "tree_soil", ActionKind::Plant);
    act(&mut controller, "talking_tree", ActionKind::Talk);
    controller.abandon();

    assert_eq!(controller.world(), &before);
}

#[test]
fn each_object_applies_at_most_once_per_life() {
    let mut controller = fresh();

    for _ in 0..3 {
        act(&mut controller, "talking_tree", ActionKind::Talk);
        act(&mut controller, "simple_door", ActionKind::Open);
    }

    let events = controller.session().unwrap().events();
    assert_eq!(events.len(), 2);
    let summary = run_out(&mut controller).summary.unwrap();
    assert_eq!(summary.report.npc_visits.get(&NpcId::from("talking_tree")), Some(&1));
}

#[test]
fn unlocks_never_shrink() {
    let mut controller = fresh();
    let plan: &[&[(&str, ActionKind)]] = &[
        &[("old_key", ActionKind::PickUp)],
        &[("tower_door", ActionKind::Open)],
        &[("torch", ActionKind::PickUp), ("vines", ActionKind::Burn)],
        &[("mirror_twin", ActionKind::Talk), ("memory_switch", ActionKind::Activate)],
        &[],
    ];

    let mut seen = controller.world().unlocked_zones.clone();
    for life in plan {
        for (object, action) in life.iter() {
            act(&mut controller, object, *action);
        }
        run_out(&mut controller);
        let zones = &controller.world().unlocked_zones;
        assert!(zones.is_superset(&seen));
        seen = zones.clone();
    }

    assert!(seen.contains(&ZoneId::from("memory_cavern")));
    assert!(controller.world().is_flag_set(&FlagKey::from("memory_restored")));
    assert_eq!(controller.world().npc_memory(&NpcId::from("talking_tree")).stage, 2);
}

#[test]
fn same_inputs_give_same_world() {
    fn play() -> WorldState {
        let mut controller = fresh();
        act(&mut controller, "seed", ActionKind::PickUp);
        act(&mut controller, "tree_soil", ActionKind::Plant);
        act(&mut controller, "talking_tree", ActionKind::Talk);
        run_out(&mut controller);
        act(&mut controller, "old_key", ActionKind::PickUp);
        controller.tick(TickInput::wait(0.2).dying("spikes")).unwrap();
        controller.world().clone()
    }

    assert_eq!(play(), play());
}

/// Persistence whose writes can be switched off.
struct FlakyDisk {
    failing: Rc<Cell<bool>>,
    saves: Rc<Cell<u32>>,
    inner: MemoryPersistence,
}

impl Persistence for FlakyDisk {
    fn load(&self) -> Result<Option<WorldState>, PersistError> {
        self.inner.load()
    }

    fn save(&mut self, state: &WorldState) -> Result<(), PersistError> {
        if self.failing.get() {
            return Err(PersistError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "read-only file system",
            )));
        }
        self.saves.set(self.saves.get() + 1);
        self.inner.save(state)
    }
}

#[test]
fn failed_commit_halts_until_retried() {
    let failing = Rc::new(Cell::new(true));
    let saves = Rc::new(Cell::new(0));
    let disk = FlakyDisk {
        failing: Rc::clone(&failing),
        saves: Rc::clone(&saves),
        inner: MemoryPersistence::new(),
    };
    let mut controller = controller_with(WorldStore::new(bible(), Box::new(disk)), LifeConfig::default());
    let before = controller.world().clone();

    act(&mut controller, "old_key", ActionKind::PickUp);
    let err = controller.tick(TickInput::wait(10.0)).unwrap_err();

    assert!(matches!(err, ControllerError::CommitFailed(_)));
    assert_eq!(controller.phase(), ControllerPhase::Halted);
    assert_eq!(controller.world(), &before);
    assert!(matches!(controller.tick(TickInput::wait(0.1)), Err(ControllerError::Halted)));
    assert!(matches!(controller.start_life(), Err(ControllerError::Halted)));

    let pending = controller.pending_record().cloned().unwrap();
    failing.set(false);
    let summary = controller.retry_commit().unwrap();

    assert_eq!(summary.life, pending.life);
    assert_eq!(saves.get(), 1);
    assert_eq!(controller.world().lives, 1);
    assert!(controller.world().is_flag_set(&FlagKey::from("key_found")));
    assert_eq!(controller.phase(), ControllerPhase::Idle);
    assert!(matches!(controller.retry_commit(), Err(ControllerError::NothingToRetry)));
}

#[test]
fn commits_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("world_state.json");

    {
        let store = WorldStore::open(bible(), Box::new(JsonFileStore::new(&path)));
        let mut controller = controller_with(store, LifeConfig::default());
        act(&mut controller, "old_key", ActionKind::PickUp);
        run_out(&mut controller);
    }

    let store = WorldStore::open(bible(), Box::new(JsonFileStore::new(&path)));
    assert_eq!(store.state().lives, 1);
    assert!(store.state().zone_unlocked(&ZoneId::from("tower")));
}

#[test]
fn corrupt_save_falls_back_to_initial_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("world_state.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let store = WorldStore::open(bible(), Box::new(JsonFileStore::new(&path)));
    assert_eq!(store.state(), &bible().initial_state());
}

#[test]
fn carried_item_survives_with_keep_policy() {
    let store = WorldStore::new(bible(), Box::new(MemoryPersistence::new()));
    let mut controller = controller_with(
        store,
        LifeConfig {
            carryover: life_core::InventoryCarryover::Keep,
            ..LifeConfig::default()
        },
    );

    act(&mut controller, "seed", ActionKind::PickUp);
    run_out(&mut controller);
    assert_eq!(controller.world().carried_over, Some(ItemId::from("seed")));

    controller.start_life().unwrap();
    assert_eq!(controller.session().unwrap().carried(), Some(&ItemId::from("seed")));
    assert_eq!(
        act(&mut controller, "old_key", ActionKind::PickUp),
        Resolution::Rejected(RejectReason::InventoryFull)
    );
}

/// Only objects within a fixed radius are reachable; the left edge is lava.
struct Reach {
    bible: Arc<WorldBible>,
    radius: f32,
}

impl ZoneGeometry for Reach {
    fn is_walkable(&self, _zone: &ZoneId, position: Position) -> bool {
        position.x >= 0.0 && position.y >= 0.0
    }

    fn objects_in_range(&self, zone: &ZoneId, position: Position) -> Vec<ObjectId> {
        self.bible
            .zone(zone)
            .map(|zone| {
                zone.objects
                    .iter()
                    .filter(|object| object.position.is_some_and(|at| at.distance(position) <= self.radius))
                    .map(|object| object.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn hazard_at(&self, _zone: &ZoneId, position: Position) -> Option<String> {
        (position.x < 10.0).then(|| "lava".to_owned())
    }
}

#[test]
fn geometry_controls_reach_movement_and_hazards() {
    let bible = bible();
    let store = WorldStore::new(Arc::clone(&bible), Box::new(MemoryPersistence::new()));
    let mut controller = LifeCycleController::new(store, Reach { bible, radius: 40.0 }, LifeConfig::default());

    assert_eq!(
        act(&mut controller, "seed", ActionKind::PickUp),
        Resolution::Rejected(RejectReason::OutOfRange)
    );

    let frame = controller
        .tick(TickInput::wait(0.1).moving_to(Position::new(-5.0, 50.0)))
        .unwrap();
    assert!(frame.blocked);

    let frame = controller
        .tick(
            TickInput::wait(0.1)
                .moving_to(Position::new(300.0, 390.0))
                .interacting("seed", ActionKind::PickUp),
        )
        .unwrap();
    assert!(frame.resolution.unwrap().is_applied());

    let frame = controller
        .tick(TickInput::wait(0.1).moving_to(Position::new(5.0, 390.0)))
        .unwrap();
    let summary = frame.summary.unwrap();
    assert_eq!(summary.ending, world_rules::LifeEnding::Died { cause: "lava".into() });
}

#[test]
fn life_summary_serializes_for_front_ends() {
    let mut controller = fresh();
    let summary = run_out(&mut controller).summary.unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["ending"]["ending"], serde_json::json!("timed_out"));
    assert_eq!(json["report"]["lives"], serde_json::json!(1));
}

#[test]
fn objective_advances_across_commits() {
    let mut controller = fresh();
    assert_eq!(controller.objective(), Some("Talk to the Talking Tree"));

    let frame = controller
        .tick(TickInput::wait(0.1).interacting("talking_tree", ActionKind::Talk))
        .unwrap();
    // the running life does not move the objective until it is committed
    assert_eq!(frame.objective.as_deref(), Some("Talk to the Talking Tree"));

    let last = run_out(&mut controller);
    assert_eq!(last.objective.as_deref(), Some("Pick up the GOLDEN KEY next to the tree"));

    act(&mut controller, "old_key", ActionKind::PickUp);
    act(&mut controller, "simple_door", ActionKind::Open);
    run_out(&mut controller);
    assert_eq!(controller.objective(), Some("Collect the SHINY COIN near the tree"));
}

#[test]
fn coin_waits_for_the_first_door() {
    let mut controller = fresh();
    assert_eq!(
        act(&mut controller, "coin", ActionKind::PickUp),
        Resolution::Rejected(RejectReason::PreconditionUnmet)
    );
}
