//! Pedestrians and the AI controllers that walk them
//!
//! A walker is only kept once its controller exists. Walkers whose
//! controller could not be created are destroyed on the spot.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::seq::IndexedRandom;
use rand::Rng;

use super::cancel::CancelToken;
use super::registry::EntityRegistry;
use super::step::StepMode;
use super::types::WalkerPair;
use crate::world::{
    ActorId, Blueprint, BlueprintLibrary, Command, SpawnActor, Transform, WorldClient,
    WALKER_CONTROLLER_ID,
};

pub const WALKER_PATTERN: &str = "walker.pedestrian.*";

/// Index of the walking speed among a template's recommended speeds
const WALKING_SPEED_SLOT: usize = 1;

/// Outcome of creating walker/controller pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairingReport {
    pub requested: usize,
    /// Walker creation attempts made
    pub attempts: usize,
    pub paired: usize,
    /// Walkers destroyed because their controller failed
    pub orphans_destroyed: Vec<ActorId>,
}

/// A walker template ready to spawn, with the speed it will walk at
struct WalkerPlan {
    blueprint: Blueprint,
    speed: f32,
}

fn plan_walker(candidates: &[Blueprint], fallback_speed: f32, rng: &mut impl Rng) -> Option<WalkerPlan> {
    let mut blueprint = candidates.choose(rng)?.clone();

    if blueprint.has_attribute("is_invincible") {
        if let Err(e) = blueprint.set_attribute("is_invincible", "false") {
            debug!("{} stays invincible: {}", blueprint.id, e);
        }
    }

    let speed = blueprint
        .attribute("speed")
        .and_then(|attribute| attribute.recommended_values.get(WALKING_SPEED_SLOT))
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(fallback_speed);

    Some(WalkerPlan { blueprint, speed })
}

fn walker_templates(library: &BlueprintLibrary) -> Result<(Vec<Blueprint>, Blueprint)> {
    let walkers = library.filter(WALKER_PATTERN);
    if walkers.is_empty() {
        anyhow::bail!("No pedestrian templates match {}", WALKER_PATTERN);
    }
    let controller = library
        .find(WALKER_CONTROLLER_ID)
        .context("Walker controller template missing from the library")?;
    Ok((walkers, controller))
}

/// Destroy a walker left without a controller
fn discard_orphan<W: WorldClient>(world: &mut W, walker: ActorId, report: &mut PairingReport) {
    if !world.destroy_actor(walker) {
        warn!("Orphaned walker {} was already gone", walker);
    }
    report.orphans_destroyed.push(walker);
}

/// Spawn every walker in one batch, then every controller in a second batch
pub fn spawn_walkers_batched<W: WorldClient>(
    world: &mut W,
    library: &BlueprintLibrary,
    count: usize,
    fallback_speed: f32,
    registry: &mut EntityRegistry,
    rng: &mut impl Rng,
) -> Result<PairingReport> {
    let mut report = PairingReport {
        requested: count,
        ..PairingReport::default()
    };
    let (candidates, controller_bp) = walker_templates(library)?;

    let locations: Vec<_> = (0..count)
        .filter_map(|_| world.random_navigation_location())
        .collect();

    let mut speeds = Vec::with_capacity(locations.len());
    let mut batch = Vec::with_capacity(locations.len());
    for location in locations {
        let Some(plan) = plan_walker(&candidates, fallback_speed, rng) else {
            continue;
        };
        speeds.push(plan.speed);
        batch.push(Command::from(SpawnActor::new(plan.blueprint, Transform::at(location))));
    }
    report.attempts = batch.len();

    let mut walkers = Vec::new();
    for (response, speed) in world.apply_batch_sync(batch, true).into_iter().zip(speeds) {
        match response {
            Ok(id) => walkers.push((id, speed)),
            Err(e) => debug!("Walker spawn failed: {}", e),
        }
    }

    let controllers: Vec<Command> = walkers
        .iter()
        .map(|(walker, _)| {
            SpawnActor::new(controller_bp.clone(), Transform::default())
                .attached_to(*walker)
                .into()
        })
        .collect();

    let responses = world.apply_batch_sync(controllers, true);
    for ((walker, speed), response) in walkers.into_iter().zip(responses) {
        match response {
            Ok(controller) => {
                registry.push_pair(WalkerPair {
                    walker,
                    controller,
                    speed,
                });
                report.paired += 1;
            }
            Err(e) => {
                warn!("Controller for walker {} failed: {}", walker, e);
                discard_orphan(world, walker, &mut report);
            }
        }
    }

    Ok(report)
}

/// Spawn one walker and its controller at a time, giving up after
/// `2 × count` attempts. Falling short of `count` is not an error.
pub fn spawn_walkers_retrying<W: WorldClient>(
    world: &mut W,
    library: &BlueprintLibrary,
    count: usize,
    fallback_speed: f32,
    registry: &mut EntityRegistry,
    rng: &mut impl Rng,
    cancel: &CancelToken,
) -> Result<PairingReport> {
    let mut report = PairingReport {
        requested: count,
        ..PairingReport::default()
    };
    let (candidates, controller_bp) = walker_templates(library)?;
    let max_attempts = count * 2;

    while report.paired < count && report.attempts < max_attempts {
        if cancel.is_cancelled() {
            info!("Walker spawning interrupted after {} pairs", report.paired);
            break;
        }
        report.attempts += 1;

        let Some(location) = world.random_navigation_location() else {
            continue;
        };
        let Some(plan) = plan_walker(&candidates, fallback_speed, rng) else {
            continue;
        };

        let Some(walker) = world.try_spawn_actor(&plan.blueprint, &Transform::at(location), None)
        else {
            continue;
        };

        match world.try_spawn_actor(&controller_bp, &Transform::default(), Some(walker)) {
            Some(controller) => {
                registry.push_pair(WalkerPair {
                    walker,
                    controller,
                    speed: plan.speed,
                });
                report.paired += 1;
            }
            None => {
                warn!("Controller for walker {} failed", walker);
                discard_orphan(world, walker, &mut report);
            }
        }
    }

    if report.paired < count {
        info!(
            "Placed {}/{} walkers after {} attempts",
            report.paired, count, report.attempts
        );
    }
    Ok(report)
}

/// Set walkers in motion once their controllers are visible in the world
pub fn start_walkers<W: WorldClient>(
    world: &mut W,
    pairs: &[WalkerPair],
    step_mode: StepMode,
) -> Result<usize> {
    if pairs.is_empty() {
        return Ok(0);
    }

    step_mode
        .step(world)
        .context("Failed to advance the world before starting walkers")?;

    // Pedestrians stay on crossings
    world.set_pedestrians_cross_factor(0.0);

    let mut started = 0;
    for pair in pairs {
        if let Err(e) = world.start_controller(pair.controller) {
            warn!("Controller {} did not start: {}", pair.controller, e);
            continue;
        }
        if let Some(destination) = world.random_navigation_location() {
            if let Err(e) = world.go_to_location(pair.controller, destination) {
                warn!("Controller {} has no destination: {}", pair.controller, e);
            }
        }
        if let Err(e) = world.set_max_speed(pair.controller, pair.speed) {
            warn!("Controller {} keeps its default speed: {}", pair.controller, e);
        }
        started += 1;
    }

    Ok(started)
}
