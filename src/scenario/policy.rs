//! Uniform safety policy for every autopiloted vehicle
//!
//! Application is best effort: one vehicle failing never blocks the rest,
//! and every outcome is reported rather than swallowed.

use log::{debug, info, warn};

use super::registry::EntityRegistry;
use super::types::AUTOPILOT_ROLE;
use crate::world::{ActorId, TrafficManager, WorldClient, WorldError};

/// Driving parameters applied to every autopiloted vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyPolicy {
    /// Meters kept to the vehicle ahead
    pub min_following_distance: f32,
    /// Random lane change percentage, left and right
    pub max_lane_change_rate: f32,
    /// Percentage below the speed limit
    pub speed_derate_pct: f32,
    pub ignore_lights_pct: f32,
    pub ignore_signs_pct: f32,
    /// Keep-right (or keep-slow-lane) rule percentage
    pub lane_keep_rule_pct: f32,
    pub auto_lane_change: bool,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            min_following_distance: 5.0,
            max_lane_change_rate: 0.0,
            speed_derate_pct: 50.0,
            ignore_lights_pct: 0.0,
            ignore_signs_pct: 0.0,
            lane_keep_rule_pct: 0.0,
            auto_lane_change: false,
        }
    }
}

/// Which lane-bias rule the traffic manager accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneBias {
    KeepRight,
    KeepSlowLane,
    /// Neither call exists on this engine version
    Unavailable,
}

/// Result of applying the policy to one vehicle
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutcome {
    Applied(LaneBias),
    /// Parked or otherwise not autopiloted; left alone on purpose
    Skipped,
    Failed(WorldError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyReport {
    pub applied: usize,
    pub lane_bias_unavailable: usize,
    pub skipped: usize,
    pub failures: Vec<(ActorId, WorldError)>,
}

impl PolicyReport {
    fn record(&mut self, actor: ActorId, outcome: PolicyOutcome) {
        match outcome {
            PolicyOutcome::Applied(bias) => {
                self.applied += 1;
                if bias == LaneBias::Unavailable {
                    self.lane_bias_unavailable += 1;
                }
            }
            PolicyOutcome::Skipped => self.skipped += 1,
            PolicyOutcome::Failed(e) => self.failures.push((actor, e)),
        }
    }
}

/// Global traffic manager defaults derived from the policy
pub fn configure_traffic_manager<T: TrafficManager>(
    traffic_manager: &mut T,
    policy: &SafetyPolicy,
    synchronous: bool,
) {
    traffic_manager.set_global_distance_to_leading_vehicle(policy.min_following_distance);
    traffic_manager.global_percentage_speed_difference(policy.speed_derate_pct);
    if synchronous {
        traffic_manager.set_synchronous_mode(true);
    }
    debug!(
        "Traffic manager on port {} configured (synchronous: {})",
        traffic_manager.port(),
        synchronous
    );
}

/// Try the keep-right rule, then the older keep-slow-lane spelling
fn disable_lane_bias<T: TrafficManager>(
    traffic_manager: &mut T,
    actor: ActorId,
    percentage: f32,
) -> LaneBias {
    match traffic_manager.keep_right_rule_percentage(actor, percentage) {
        Ok(()) => return LaneBias::KeepRight,
        Err(e) => debug!("keep-right rule rejected for {}: {}", actor, e),
    }
    match traffic_manager.keep_slow_lane_rule_percentage(actor, percentage) {
        Ok(()) => LaneBias::KeepSlowLane,
        Err(e) => {
            debug!("keep-slow-lane rule rejected for {}: {}", actor, e);
            LaneBias::Unavailable
        }
    }
}

/// Apply every per-vehicle setting; the first hard failure aborts this vehicle only
pub fn apply_safety_policy<T: TrafficManager>(
    traffic_manager: &mut T,
    actor: ActorId,
    policy: &SafetyPolicy,
) -> Result<LaneBias, WorldError> {
    traffic_manager.auto_lane_change(actor, policy.auto_lane_change)?;
    traffic_manager.random_left_lanechange_percentage(actor, policy.max_lane_change_rate)?;
    traffic_manager.random_right_lanechange_percentage(actor, policy.max_lane_change_rate)?;
    traffic_manager.distance_to_leading_vehicle(actor, policy.min_following_distance)?;
    traffic_manager.vehicle_percentage_speed_difference(actor, policy.speed_derate_pct)?;
    traffic_manager.ignore_lights_percentage(actor, policy.ignore_lights_pct)?;
    traffic_manager.ignore_signs_percentage(actor, policy.ignore_signs_pct)?;
    Ok(disable_lane_bias(traffic_manager, actor, policy.lane_keep_rule_pct))
}

fn apply_to_vehicle<W: WorldClient>(
    world: &mut W,
    actor: ActorId,
    policy: &SafetyPolicy,
    tm_port: u16,
) -> PolicyOutcome {
    if world.actor_attribute(actor, "role_name").as_deref() != Some(AUTOPILOT_ROLE) {
        return PolicyOutcome::Skipped;
    }

    let bias = match apply_safety_policy(world.traffic_manager(tm_port), actor, policy) {
        Ok(bias) => bias,
        Err(e) => return PolicyOutcome::Failed(e),
    };

    match world.set_simulate_physics(actor, true) {
        Ok(()) => PolicyOutcome::Applied(bias),
        Err(e) => PolicyOutcome::Failed(e),
    }
}

/// Apply the policy to every autopiloted vehicle in the registry
pub fn apply_policy_to_registry<W: WorldClient>(
    world: &mut W,
    registry: &EntityRegistry,
    policy: &SafetyPolicy,
    tm_port: u16,
) -> PolicyReport {
    info!("Applying Safe-Driving settings...");

    let mut report = PolicyReport::default();
    for entity in registry.vehicles() {
        let outcome = apply_to_vehicle(world, entity.id, policy, tm_port);
        if let PolicyOutcome::Failed(e) = &outcome {
            warn!("Safe-driving policy not applied to {}: {}", entity.id, e);
        }
        report.record(entity.id, outcome);
    }

    if report.lane_bias_unavailable > 0 {
        debug!(
            "Lane-bias rule unavailable for {} vehicles",
            report.lane_bias_unavailable
        );
    }
    info!(
        "Safe-driving policy applied to {} vehicles ({} skipped, {} failed)",
        report.applied,
        report.skipped,
        report.failures.len()
    );
    report
}
