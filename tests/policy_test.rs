use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

use scenario_spawner::scenario::{
    apply_policy_to_registry, apply_safety_policy, configure_traffic_manager, spawn_fixed_group,
    spawn_random_vehicles, AnchorReservations, EntityKind, EntityRegistry, FixedGroup, LaneBias,
    ObstacleKind, SafetyPolicy,
};
use scenario_spawner::world::{ActorId, LaneBiasApi, SimWorld, WorldClient, WorldError};

const TM_PORT: u16 = 8005;

/// One parked vehicle at anchor 120 and `count` autopiloted ones elsewhere
fn populated_world(seed: u64, count: usize) -> (SimWorld, EntityRegistry) {
    let mut world = SimWorld::new_with_seed(seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let anchors = world.spawn_points();
    let library = world.blueprint_library();
    let mut reservations = AnchorReservations::new();
    let mut registry = EntityRegistry::new();

    spawn_fixed_group(
        &mut world,
        &anchors,
        &library,
        &FixedGroup::new(ObstacleKind::Vehicle, &[(120, (0.0, 0.0))]),
        TM_PORT,
        &mut reservations,
        &mut registry,
        &mut rng,
    );
    reservations.freeze();
    spawn_random_vehicles(
        &mut world,
        &anchors,
        &library,
        count,
        TM_PORT,
        false,
        &reservations,
        &BTreeSet::new(),
        &mut registry,
        &mut rng,
    );
    (world, registry)
}

fn random_vehicle_ids(registry: &EntityRegistry) -> Vec<ActorId> {
    registry
        .vehicles()
        .iter()
        .filter(|entity| entity.kind == EntityKind::RandomVehicle)
        .map(|entity| entity.id)
        .collect()
}

#[test]
fn test_policy_reaches_every_autopilot_vehicle() {
    let (mut world, registry) = populated_world(41, 5);
    let policy = SafetyPolicy::default();

    let report = apply_policy_to_registry(&mut world, &registry, &policy, TM_PORT);

    assert_eq!(report.applied, 5);
    assert_eq!(report.skipped, 1);
    assert!(report.failures.is_empty());
    assert_eq!(report.lane_bias_unavailable, 0);

    for id in random_vehicle_ids(&registry) {
        let settings = world
            .sim_traffic_manager()
            .policy(id)
            .expect("registered with the traffic manager");
        assert!(!settings.auto_lane_change);
        assert_eq!(settings.left_lane_change_percentage, 0.0);
        assert_eq!(settings.right_lane_change_percentage, 0.0);
        assert_eq!(settings.distance_to_leading_vehicle, Some(5.0));
        assert_eq!(settings.speed_difference_percentage, Some(50.0));
        assert_eq!(settings.ignore_lights_percentage, 0.0);
        assert_eq!(settings.ignore_signs_percentage, 0.0);
        assert_eq!(settings.lane_bias_percentage, Some(0.0));
        assert!(world.actor(id).expect("alive").simulate_physics);
    }
}

#[test]
fn test_parked_vehicle_is_left_alone() {
    let (mut world, registry) = populated_world(42, 2);
    let parked = registry
        .vehicles()
        .iter()
        .find(|entity| entity.kind == EntityKind::FixedVehicle)
        .expect("parked vehicle")
        .id;

    apply_policy_to_registry(&mut world, &registry, &SafetyPolicy::default(), TM_PORT);

    let actor = world.actor(parked).expect("parked vehicle alive");
    assert!(!actor.autopilot);
    assert!(actor.control.hand_brake);
    assert!(world.sim_traffic_manager().policy(parked).is_none());
    assert!(world
        .sim_traffic_manager()
        .registered_vehicles()
        .all(|id| id != parked));
}

#[test]
fn test_one_failing_vehicle_does_not_block_the_rest() {
    let (mut world, registry) = populated_world(43, 4);
    let ids = random_vehicle_ids(&registry);
    world.sim_traffic_manager_mut().fail_policy_for(ids[0]);

    let report = apply_policy_to_registry(&mut world, &registry, &SafetyPolicy::default(), TM_PORT);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, ids[0]);
    assert!(matches!(report.failures[0].1, WorldError::Backend(_)));
    assert_eq!(report.applied, 3);

    for id in &ids[1..] {
        let settings = world.sim_traffic_manager().policy(*id).expect("registered");
        assert_eq!(settings.distance_to_leading_vehicle, Some(5.0));
    }
}

#[test]
fn test_lane_bias_falls_back_to_keep_slow_lane() {
    let (mut world, registry) = populated_world(44, 1);
    let id = random_vehicle_ids(&registry)[0];
    world.set_lane_bias_api(LaneBiasApi::KeepSlowLane);

    let bias = apply_safety_policy(
        world.traffic_manager(TM_PORT),
        id,
        &SafetyPolicy::default(),
    )
    .expect("policy applies");

    assert_eq!(bias, LaneBias::KeepSlowLane);
    assert_eq!(
        world.sim_traffic_manager().policy(id).expect("registered").lane_bias_percentage,
        Some(0.0)
    );
}

#[test]
fn test_missing_lane_bias_api_is_not_a_failure() {
    let (mut world, registry) = populated_world(45, 3);
    world.set_lane_bias_api(LaneBiasApi::Missing);

    let report = apply_policy_to_registry(&mut world, &registry, &SafetyPolicy::default(), TM_PORT);

    assert_eq!(report.applied, 3);
    assert_eq!(report.lane_bias_unavailable, 3);
    assert!(report.failures.is_empty());
}

#[test]
fn test_unregistered_vehicle_reports_not_registered() {
    let mut world = SimWorld::new_with_seed(46);

    let result = apply_safety_policy(
        world.traffic_manager(TM_PORT),
        ActorId(999),
        &SafetyPolicy::default(),
    );

    assert_eq!(result, Err(WorldError::NotRegistered(ActorId(999))));
}

#[test]
fn test_global_traffic_manager_settings() {
    let mut world = SimWorld::new_with_seed(47);
    let policy = SafetyPolicy {
        min_following_distance: 8.0,
        speed_derate_pct: 30.0,
        ..SafetyPolicy::default()
    };

    configure_traffic_manager(world.traffic_manager(TM_PORT), &policy, true);

    let tm = world.sim_traffic_manager();
    assert_eq!(tm.global_distance_to_leading_vehicle, 8.0);
    assert_eq!(tm.global_speed_difference_percentage, 30.0);
    assert!(tm.synchronous_mode);
    assert_eq!(scenario_spawner::world::TrafficManager::port(tm), TM_PORT);
}
