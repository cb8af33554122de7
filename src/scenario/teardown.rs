//! Deterministic removal of everything a run created

use log::{info, warn};
use std::time::Duration;

use super::registry::EntityRegistry;
use crate::world::{destroy_all, WorldClient};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeardownReport {
    pub restored_free_running: bool,
    pub controllers_stopped: usize,
    pub stop_failures: usize,
    pub vehicles_destroyed: usize,
    pub walker_actors_destroyed: usize,
}

impl TeardownReport {
    pub fn destroyed(&self) -> usize {
        self.vehicles_destroyed + self.walker_actors_destroyed
    }
}

/// Restore free-running mode if we own stepping, stop every controller and
/// destroy everything the registry holds.
///
/// The registry is drained, so a second call destroys nothing.
pub fn teardown<W: WorldClient>(
    world: &mut W,
    registry: &mut EntityRegistry,
    synchronous_master: bool,
    settle_delay: Duration,
) -> TeardownReport {
    let mut report = TeardownReport::default();
    let owned = registry.take();

    if synchronous_master {
        let mut settings = world.settings();
        settings.synchronous_mode = false;
        settings.fixed_delta_seconds = None;
        match world.apply_settings(settings) {
            Ok(_) => report.restored_free_running = true,
            Err(e) => warn!("Could not restore free-running mode: {}", e),
        }
    }

    for pair in owned.pairs() {
        match world.stop_controller(pair.controller) {
            Ok(()) => report.controllers_stopped += 1,
            Err(e) => {
                warn!("Controller {} could not be stopped: {}", pair.controller, e);
                report.stop_failures += 1;
            }
        }
    }

    let vehicle_ids = owned.vehicle_ids();
    if !vehicle_ids.is_empty() {
        world.apply_batch(destroy_all(&vehicle_ids));
    }
    report.vehicles_destroyed = vehicle_ids.len();

    let walker_ids = owned.interleaved_walker_ids();
    if !walker_ids.is_empty() {
        world.apply_batch(destroy_all(&walker_ids));
    }
    report.walker_actors_destroyed = walker_ids.len();

    if !settle_delay.is_zero() {
        std::thread::sleep(settle_delay);
    }

    info!(
        "Cleanup done. (Destroyed {} vehicles, {} walker actors)",
        report.vehicles_destroyed, report.walker_actors_destroyed
    );
    report
}
