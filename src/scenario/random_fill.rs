//! Random traffic: one batch of autopiloted vehicles on unreserved anchors

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

use super::fixed::AnchorReservations;
use super::registry::EntityRegistry;
use super::templates::{candidate_templates, pick_template};
use super::types::{AnchorIndex, EntityKind, SpawnedEntity, AUTOPILOT_ROLE};
use crate::world::{
    BlueprintLibrary, Command, FutureCommand, SpawnActor, Transform, WorldClient, WorldError,
};

pub const VEHICLE_PATTERN: &str = "vehicle.*";

/// Outcome of the random fill batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RandomFillReport {
    pub requested: usize,
    /// Anchors a creation request was sent for, in batch order
    pub selected: Vec<AnchorIndex>,
    pub spawned: usize,
    pub failures: Vec<(AnchorIndex, WorldError)>,
}

/// Shuffle the unreserved anchors and keep the first `count`.
/// Fewer come back when the complement is smaller.
pub fn select_fill_anchors(
    catalog_len: usize,
    reservations: &AnchorReservations,
    keep_clear: &BTreeSet<AnchorIndex>,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<AnchorIndex> {
    let mut available = reservations.complement(catalog_len, keep_clear);
    available.shuffle(rng);
    available.truncate(count);
    available
}

/// Create `count` autopiloted vehicles in a single synchronous batch
#[allow(clippy::too_many_arguments)]
pub fn spawn_random_vehicles<W: WorldClient>(
    world: &mut W,
    anchors: &[Transform],
    library: &BlueprintLibrary,
    count: usize,
    tm_port: u16,
    synchronous_master: bool,
    reservations: &AnchorReservations,
    keep_clear: &BTreeSet<AnchorIndex>,
    registry: &mut EntityRegistry,
    rng: &mut impl Rng,
) -> RandomFillReport {
    let mut report = RandomFillReport {
        requested: count,
        ..RandomFillReport::default()
    };

    info!("--- Spawning {} Random Vehicles ---", count);
    if count == 0 {
        return report;
    }

    let candidates = candidate_templates(library, VEHICLE_PATTERN, true);
    if candidates.is_empty() {
        warn!("No four-wheeled vehicle templates available, skipping random traffic");
        return report;
    }

    let selected = select_fill_anchors(anchors.len(), reservations, keep_clear, count, rng);
    if selected.len() < count {
        debug!(
            "Only {} free anchors for {} requested vehicles",
            selected.len(),
            count
        );
    }

    let mut batch = Vec::with_capacity(selected.len());
    let mut submitted = Vec::with_capacity(selected.len());
    for index in selected {
        let Some(mut blueprint) = pick_template(&candidates, rng) else {
            continue;
        };
        if let Err(e) = blueprint.set_attribute("role_name", AUTOPILOT_ROLE) {
            warn!("Template {} cannot carry the autopilot role: {}", blueprint.id, e);
        }

        batch.push(Command::from(
            SpawnActor::new(blueprint, anchors[index]).then(FutureCommand::SetAutopilot {
                enabled: true,
                tm_port,
            }),
        ));
        submitted.push(index);
    }

    let responses = world.apply_batch_sync(batch, synchronous_master);

    for (&index, response) in submitted.iter().zip(responses) {
        match response {
            Ok(id) => {
                registry.push_vehicle(SpawnedEntity {
                    id,
                    kind: EntityKind::RandomVehicle,
                    anchor: index,
                });
                report.spawned += 1;
            }
            Err(e) => {
                warn!("Random vehicle at Index {} failed: {}", index, e);
                report.failures.push((index, e));
            }
        }
    }

    report.selected = submitted;
    info!(
        "Spawned {}/{} random vehicles",
        report.spawned, report.requested
    );
    report
}
