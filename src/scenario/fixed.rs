//! Anchor reservation and fixed obstacle placement
//!
//! Fixed placements claim their anchor before the spawn is attempted, so the
//! random fill stage never competes for an anchor whose outcome is unknown.

use log::{info, warn};
use rand::Rng;
use std::collections::BTreeSet;

use super::config::FixedGroup;
use super::offset::offset_transform;
use super::registry::EntityRegistry;
use super::templates::{candidate_templates, pick_template};
use super::types::{AnchorIndex, SpawnedEntity};
use crate::world::{BlueprintLibrary, Transform, VehicleControl, WorldClient};

/// Anchors consumed by fixed placements
#[derive(Debug, Clone, Default)]
pub struct AnchorReservations {
    reserved: BTreeSet<AnchorIndex>,
    frozen: bool,
}

impl AnchorReservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an anchor. Returns false once the table is frozen.
    pub fn reserve(&mut self, index: AnchorIndex) -> bool {
        if self.frozen {
            warn!("Anchor {} not reserved: reservations are frozen", index);
            return false;
        }
        self.reserved.insert(index);
        true
    }

    /// Stop accepting reservations; random fill may start
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn contains(&self, index: AnchorIndex) -> bool {
        self.reserved.contains(&index)
    }

    pub fn reserved(&self) -> &BTreeSet<AnchorIndex> {
        &self.reserved
    }

    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }

    /// Catalog indices that are neither reserved nor in `keep_clear`, ascending
    pub fn complement(&self, catalog_len: usize, keep_clear: &BTreeSet<AnchorIndex>) -> Vec<AnchorIndex> {
        (0..catalog_len)
            .filter(|index| !self.reserved.contains(index) && !keep_clear.contains(index))
            .collect()
    }
}

/// What happened to one group of fixed placements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedPlacementReport {
    pub spawned: Vec<AnchorIndex>,
    pub failed: Vec<AnchorIndex>,
    pub out_of_range: Vec<AnchorIndex>,
}

impl FixedPlacementReport {
    pub fn attempted(&self) -> usize {
        self.spawned.len() + self.failed.len()
    }
}

/// Spawn one obstacle group at its anchors, parking anything vehicle-like.
/// Individual failures are logged and skipped.
#[allow(clippy::too_many_arguments)]
pub fn spawn_fixed_group<W: WorldClient>(
    world: &mut W,
    anchors: &[Transform],
    library: &BlueprintLibrary,
    group: &FixedGroup,
    tm_port: u16,
    reservations: &mut AnchorReservations,
    registry: &mut EntityRegistry,
    rng: &mut impl Rng,
) -> FixedPlacementReport {
    let mut report = FixedPlacementReport::default();
    if group.placements.is_empty() {
        return report;
    }

    let kind = group.kind;
    info!("Spawning {} ({})...", kind.name(), kind.filter_pattern());

    let candidates =
        candidate_templates(library, kind.filter_pattern(), kind.requires_four_wheels());

    if candidates.is_empty() {
        warn!(
            "  [Warning] No template matches {}. Skipping group.",
            kind.filter_pattern()
        );
        for &index in group.placements.keys() {
            if index >= anchors.len() {
                report.out_of_range.push(index);
            } else {
                reservations.reserve(index);
                report.failed.push(index);
            }
        }
        return report;
    }

    for (&index, &offset) in &group.placements {
        if index >= anchors.len() {
            warn!("  [Warning] Index {} is out of range. Skipping.", index);
            report.out_of_range.push(index);
            continue;
        }

        reservations.reserve(index);

        let transform = offset_transform(&anchors[index], offset);

        let Some(blueprint) = pick_template(&candidates, rng) else {
            report.failed.push(index);
            continue;
        };

        let Some(id) = world.try_spawn_actor(&blueprint, &transform, None) else {
            warn!("  -> Failed at Index {} (Collision?)", index);
            report.failed.push(index);
            continue;
        };

        if let Err(e) = world.set_simulate_physics(id, true) {
            warn!("  -> Could not enable physics on {}: {}", id, e);
        }

        if kind.is_vehicle_like() {
            if let Err(e) = world.set_autopilot(id, false, tm_port) {
                warn!("  -> Could not disable autopilot on {}: {}", id, e);
            }
            if let Err(e) = world.apply_control(id, VehicleControl::parked()) {
                warn!("  -> Could not set hand brake on {}: {}", id, e);
            }
        }

        registry.push_vehicle(SpawnedEntity {
            id,
            kind: kind.entity_kind(),
            anchor: index,
        });
        report.spawned.push(index);

        info!(
            "  -> Spawned {} at Index {} (Offset: F={}, R={})",
            blueprint.id, index, offset.forward, offset.lateral
        );
    }

    report
}
