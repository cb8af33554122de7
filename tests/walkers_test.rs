use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

use scenario_spawner::scenario::{
    spawn_walkers_batched, spawn_walkers_retrying, start_walkers, CancelToken, EntityRegistry,
    StepMode, DEFAULT_WALKER_SPEED,
};
use scenario_spawner::world::{
    ActorAttribute, ActorClass, Blueprint, BlueprintLibrary, MapLayout, SimWorld, WorldClient,
    WorldSettings, WALKER_CONTROLLER_ID,
};

#[test]
fn test_batched_walkers_are_all_paired() {
    let mut world = SimWorld::new_with_seed(31);
    let mut rng = StdRng::seed_from_u64(31);
    let library = world.blueprint_library();
    let mut registry = EntityRegistry::new();

    let report =
        spawn_walkers_batched(&mut world, &library, 10, DEFAULT_WALKER_SPEED, &mut registry, &mut rng)
            .expect("templates present");

    assert_eq!(report.requested, 10);
    assert!(report.orphans_destroyed.is_empty());
    assert_eq!(report.paired, registry.pairs().len());
    assert!(report.paired > 0);

    for pair in registry.pairs() {
        let walker = world.actor(pair.walker).expect("walker alive");
        let controller = world.actor(pair.controller).expect("controller alive");
        assert_eq!(walker.class, ActorClass::Walker);
        assert_eq!(controller.class, ActorClass::Controller);
        assert_eq!(controller.parent, Some(pair.walker));
        // Second recommended speed is the walking pace
        assert_eq!(pair.speed, 1.4);
        if let Some(flag) = walker.attributes.get("is_invincible") {
            assert_eq!(flag, "false");
        }
    }
    assert_eq!(world.destroy_calls(), 0);
}

#[test]
fn test_batched_orphans_are_destroyed() {
    // Long sidewalks so no two walkers land within spawn clearance
    let mut world = SimWorld::with_layout(
        MapLayout {
            rows: 6,
            cols: 6,
            spacing: 400.0,
            anchor_spacing: 50.0,
        },
        32,
    );
    let mut rng = StdRng::seed_from_u64(32);
    let library = world.blueprint_library();
    let mut registry = EntityRegistry::new();
    world.fail_next_controller_spawns(2);

    let report =
        spawn_walkers_batched(&mut world, &library, 10, DEFAULT_WALKER_SPEED, &mut registry, &mut rng)
            .expect("templates present");

    assert_eq!(report.attempts, 10);
    assert_eq!(report.paired, 8);
    assert_eq!(registry.pairs().len(), 8);
    assert_eq!(report.orphans_destroyed.len(), 2);
    assert_eq!(world.destroy_calls(), 2);
    for orphan in &report.orphans_destroyed {
        assert!(!world.is_alive(*orphan));
        assert!(registry.pairs().iter().all(|pair| pair.walker != *orphan));
    }

    // Nothing is left behind without a controller
    let walkers = world.actors_of(ActorClass::Walker);
    assert_eq!(walkers.len(), registry.pairs().len());
    assert_eq!(world.actors_of(ActorClass::Controller).len(), registry.pairs().len());
}

#[test]
fn test_retrying_walkers_reach_requested_count() {
    let mut world = SimWorld::new_with_seed(33);
    let mut rng = StdRng::seed_from_u64(33);
    let library = world.blueprint_library();
    let mut registry = EntityRegistry::new();

    let report = spawn_walkers_retrying(
        &mut world,
        &library,
        5,
        DEFAULT_WALKER_SPEED,
        &mut registry,
        &mut rng,
        &CancelToken::new(),
    )
    .expect("templates present");

    assert_eq!(report.paired, 5);
    assert_eq!(registry.pairs().len(), 5);
    assert!(report.attempts <= 10);
}

#[test]
fn test_retrying_walkers_give_up_after_budget() {
    let mut world = SimWorld::new_with_seed(34);
    let mut rng = StdRng::seed_from_u64(34);
    let library = world.blueprint_library();
    let mut registry = EntityRegistry::new();
    world.fail_next_controller_spawns(usize::MAX);

    let report = spawn_walkers_retrying(
        &mut world,
        &library,
        5,
        DEFAULT_WALKER_SPEED,
        &mut registry,
        &mut rng,
        &CancelToken::new(),
    )
    .expect("shortfall is not an error");

    assert_eq!(report.paired, 0);
    assert_eq!(report.attempts, 10);
    assert_eq!(report.orphans_destroyed.len(), 10);
    assert!(registry.is_empty());
    assert_eq!(world.actor_count(), 0);

    let unique: BTreeSet<_> = world.destroyed_ids().iter().collect();
    assert_eq!(unique.len(), world.destroyed_ids().len());
}

#[test]
fn test_retrying_walkers_stop_when_cancelled() {
    let mut world = SimWorld::new_with_seed(35);
    let mut rng = StdRng::seed_from_u64(35);
    let library = world.blueprint_library();
    let mut registry = EntityRegistry::new();
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = spawn_walkers_retrying(
        &mut world,
        &library,
        5,
        DEFAULT_WALKER_SPEED,
        &mut registry,
        &mut rng,
        &cancel,
    )
    .expect("templates present");

    assert_eq!(report.attempts, 0);
    assert_eq!(world.actor_count(), 0);
}

#[test]
fn test_walker_speed_falls_back_without_speed_attribute() {
    let mut world = SimWorld::new_with_seed(36);
    let mut rng = StdRng::seed_from_u64(36);
    let library = BlueprintLibrary::new(vec![
        Blueprint::new("walker.pedestrian.0100")
            .with_attribute("is_invincible", ActorAttribute::choice(&["true", "false"])),
        Blueprint::new(WALKER_CONTROLLER_ID),
    ]);
    let mut registry = EntityRegistry::new();

    spawn_walkers_batched(&mut world, &library, 3, 1.1, &mut registry, &mut rng)
        .expect("templates present");

    assert!(!registry.pairs().is_empty());
    assert!(registry.pairs().iter().all(|pair| pair.speed == 1.1));
}

#[test]
fn test_missing_controller_template_is_an_error() {
    let mut world = SimWorld::new_with_seed(37);
    let mut rng = StdRng::seed_from_u64(37);
    let library = BlueprintLibrary::new(vec![Blueprint::new("walker.pedestrian.0001")]);
    let mut registry = EntityRegistry::new();

    let result =
        spawn_walkers_batched(&mut world, &library, 3, DEFAULT_WALKER_SPEED, &mut registry, &mut rng);

    assert!(result.is_err());
    assert_eq!(world.actor_count(), 0);
}

#[test]
fn test_started_walkers_head_somewhere() {
    let mut world = SimWorld::new_with_seed(38);
    let mut rng = StdRng::seed_from_u64(38);
    let library = world.blueprint_library();
    let mut registry = EntityRegistry::new();

    spawn_walkers_batched(&mut world, &library, 6, DEFAULT_WALKER_SPEED, &mut registry, &mut rng)
        .expect("templates present");
    let frame_before = world.frame();

    let started = start_walkers(&mut world, registry.pairs(), StepMode::FreeRunning)
        .expect("free-running world steps");

    assert_eq!(started, registry.pairs().len());
    assert_eq!(world.frame(), frame_before + 1);
    assert_eq!(world.pedestrians_cross_factor(), 0.0);
    for pair in registry.pairs() {
        let state = world
            .actor(pair.controller)
            .and_then(|actor| actor.controller.clone())
            .expect("controller state");
        assert!(state.running);
        assert!(state.destination.is_some());
        assert_eq!(state.max_speed, pair.speed);
    }
}

#[test]
fn test_walkers_in_synchronous_world() {
    let mut world = SimWorld::new_with_seed(39).with_settings(WorldSettings {
        synchronous_mode: true,
        fixed_delta_seconds: Some(0.05),
    });
    let mut rng = StdRng::seed_from_u64(39);
    let library = world.blueprint_library();
    let mut registry = EntityRegistry::new();

    spawn_walkers_batched(&mut world, &library, 4, DEFAULT_WALKER_SPEED, &mut registry, &mut rng)
        .expect("templates present");
    let started = start_walkers(&mut world, registry.pairs(), StepMode::Synchronous)
        .expect("synchronous world ticks");
    assert_eq!(started, registry.pairs().len());

    // Free-running waits are refused while we own the clock
    assert!(start_walkers(&mut world, registry.pairs(), StepMode::FreeRunning).is_err());
}
