//! Traffic manager of the simulated world
//!
//! Holds per-vehicle driving policy for every vehicle registered through
//! autopilot. Which lane-bias call exists depends on the engine version.

use std::collections::{BTreeMap, HashSet};

use super::client::TrafficManager;
use super::error::WorldError;
use super::types::ActorId;

/// Which lane-bias setter this engine version understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaneBiasApi {
    #[default]
    KeepRight,
    KeepSlowLane,
    Missing,
}

/// Driving policy of one autopiloted vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePolicy {
    pub auto_lane_change: bool,
    pub left_lane_change_percentage: f32,
    pub right_lane_change_percentage: f32,
    pub distance_to_leading_vehicle: Option<f32>,
    pub speed_difference_percentage: Option<f32>,
    pub ignore_lights_percentage: f32,
    pub ignore_signs_percentage: f32,
    pub lane_bias_percentage: Option<f32>,
}

impl Default for VehiclePolicy {
    fn default() -> Self {
        Self {
            auto_lane_change: true,
            left_lane_change_percentage: 10.0,
            right_lane_change_percentage: 10.0,
            distance_to_leading_vehicle: None,
            speed_difference_percentage: None,
            ignore_lights_percentage: 0.0,
            ignore_signs_percentage: 0.0,
            lane_bias_percentage: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimTrafficManager {
    port: u16,
    pub synchronous_mode: bool,
    pub global_distance_to_leading_vehicle: f32,
    pub global_speed_difference_percentage: f32,
    pub lane_bias_api: LaneBiasApi,
    vehicles: BTreeMap<ActorId, VehiclePolicy>,
    failing: HashSet<ActorId>,
}

impl SimTrafficManager {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            synchronous_mode: false,
            global_distance_to_leading_vehicle: 2.5,
            global_speed_difference_percentage: 30.0,
            lane_bias_api: LaneBiasApi::default(),
            vehicles: BTreeMap::new(),
            failing: HashSet::new(),
        }
    }

    pub(crate) fn bind(&mut self, port: u16) {
        self.port = port;
    }

    pub(crate) fn register(&mut self, actor: ActorId) {
        self.vehicles.entry(actor).or_default();
    }

    pub(crate) fn unregister(&mut self, actor: ActorId) {
        self.vehicles.remove(&actor);
    }

    /// Make every policy call for `actor` fail
    pub fn fail_policy_for(&mut self, actor: ActorId) {
        self.failing.insert(actor);
    }

    pub fn is_registered(&self, actor: ActorId) -> bool {
        self.vehicles.contains_key(&actor)
    }

    pub fn policy(&self, actor: ActorId) -> Option<&VehiclePolicy> {
        self.vehicles.get(&actor)
    }

    pub fn registered_vehicles(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.vehicles.keys().copied()
    }

    fn policy_mut(&mut self, actor: ActorId) -> Result<&mut VehiclePolicy, WorldError> {
        if self.failing.contains(&actor) {
            return Err(WorldError::Backend(format!(
                "traffic manager lost track of vehicle {actor}"
            )));
        }
        self.vehicles
            .get_mut(&actor)
            .ok_or(WorldError::NotRegistered(actor))
    }
}

impl TrafficManager for SimTrafficManager {
    fn port(&self) -> u16 {
        self.port
    }

    fn set_synchronous_mode(&mut self, enabled: bool) {
        self.synchronous_mode = enabled;
    }

    fn set_global_distance_to_leading_vehicle(&mut self, distance: f32) {
        self.global_distance_to_leading_vehicle = distance;
    }

    fn global_percentage_speed_difference(&mut self, percentage: f32) {
        self.global_speed_difference_percentage = percentage;
    }

    fn auto_lane_change(&mut self, actor: ActorId, enabled: bool) -> Result<(), WorldError> {
        self.policy_mut(actor)?.auto_lane_change = enabled;
        Ok(())
    }

    fn random_left_lanechange_percentage(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError> {
        self.policy_mut(actor)?.left_lane_change_percentage = percentage;
        Ok(())
    }

    fn random_right_lanechange_percentage(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError> {
        self.policy_mut(actor)?.right_lane_change_percentage = percentage;
        Ok(())
    }

    fn distance_to_leading_vehicle(
        &mut self,
        actor: ActorId,
        distance: f32,
    ) -> Result<(), WorldError> {
        self.policy_mut(actor)?.distance_to_leading_vehicle = Some(distance);
        Ok(())
    }

    fn vehicle_percentage_speed_difference(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError> {
        self.policy_mut(actor)?.speed_difference_percentage = Some(percentage);
        Ok(())
    }

    fn ignore_lights_percentage(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError> {
        self.policy_mut(actor)?.ignore_lights_percentage = percentage;
        Ok(())
    }

    fn ignore_signs_percentage(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError> {
        self.policy_mut(actor)?.ignore_signs_percentage = percentage;
        Ok(())
    }

    fn keep_right_rule_percentage(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError> {
        if self.lane_bias_api != LaneBiasApi::KeepRight {
            return Err(WorldError::Unsupported("keep_right_rule_percentage"));
        }
        self.policy_mut(actor)?.lane_bias_percentage = Some(percentage);
        Ok(())
    }

    fn keep_slow_lane_rule_percentage(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError> {
        if self.lane_bias_api != LaneBiasApi::KeepSlowLane {
            return Err(WorldError::Unsupported("keep_slow_lane_rule_percentage"));
        }
        self.policy_mut(actor)?.lane_bias_percentage = Some(percentage);
        Ok(())
    }
}
