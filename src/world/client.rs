//! The seam between the scenario core and a simulation service
//!
//! Everything the orchestrator does to the world goes through these two
//! traits. Calls are blocking request/response.

use super::blueprint::{Blueprint, BlueprintLibrary};
use super::command::{Command, CommandResponse};
use super::error::WorldError;
use super::types::{ActorId, Location, Transform, VehicleControl, WorldSettings};

/// Policy engine driving autopiloted vehicles, bound to a port
pub trait TrafficManager {
    fn port(&self) -> u16;

    fn set_synchronous_mode(&mut self, enabled: bool);
    fn set_global_distance_to_leading_vehicle(&mut self, distance: f32);
    fn global_percentage_speed_difference(&mut self, percentage: f32);

    fn auto_lane_change(&mut self, actor: ActorId, enabled: bool) -> Result<(), WorldError>;
    fn random_left_lanechange_percentage(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError>;
    fn random_right_lanechange_percentage(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError>;
    fn distance_to_leading_vehicle(&mut self, actor: ActorId, distance: f32)
        -> Result<(), WorldError>;
    fn vehicle_percentage_speed_difference(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError>;
    fn ignore_lights_percentage(&mut self, actor: ActorId, percentage: f32)
        -> Result<(), WorldError>;
    fn ignore_signs_percentage(&mut self, actor: ActorId, percentage: f32)
        -> Result<(), WorldError>;

    /// Newer engines only; older ones report `Unsupported`
    fn keep_right_rule_percentage(&mut self, actor: ActorId, percentage: f32)
        -> Result<(), WorldError>;

    /// Older spelling of the lane-bias rule
    fn keep_slow_lane_rule_percentage(
        &mut self,
        actor: ActorId,
        percentage: f32,
    ) -> Result<(), WorldError>;
}

/// A connected session with a simulation world
pub trait WorldClient {
    type TrafficManager: TrafficManager;

    fn settings(&self) -> WorldSettings;

    /// Apply new settings, returning the frame they took effect on
    fn apply_settings(&mut self, settings: WorldSettings) -> Result<u64, WorldError>;

    /// The indexed anchor catalog of the loaded map
    fn spawn_points(&self) -> Vec<Transform>;

    fn blueprint_library(&self) -> BlueprintLibrary;

    /// Single-shot creation, `None` when the world refuses it
    fn try_spawn_actor(
        &mut self,
        blueprint: &Blueprint,
        transform: &Transform,
        parent: Option<ActorId>,
    ) -> Option<ActorId>;

    /// Evaluate a batch and report one response per command. With `do_tick`
    /// a synchronous world advances one step afterwards.
    fn apply_batch_sync(&mut self, commands: Vec<Command>, do_tick: bool)
        -> Vec<CommandResponse>;

    /// Evaluate a batch without collecting responses
    fn apply_batch(&mut self, commands: Vec<Command>);

    /// Returns false when the actor was already gone
    fn destroy_actor(&mut self, actor: ActorId) -> bool;

    fn actor_attribute(&self, actor: ActorId, key: &str) -> Option<String>;

    fn set_simulate_physics(&mut self, actor: ActorId, enabled: bool) -> Result<(), WorldError>;
    fn set_autopilot(&mut self, actor: ActorId, enabled: bool, tm_port: u16)
        -> Result<(), WorldError>;
    fn apply_control(&mut self, actor: ActorId, control: VehicleControl) -> Result<(), WorldError>;

    fn random_navigation_location(&mut self) -> Option<Location>;
    fn set_pedestrians_cross_factor(&mut self, percentage: f32);

    fn start_controller(&mut self, controller: ActorId) -> Result<(), WorldError>;
    fn go_to_location(&mut self, controller: ActorId, destination: Location)
        -> Result<(), WorldError>;
    fn set_max_speed(&mut self, controller: ActorId, speed: f32) -> Result<(), WorldError>;
    fn stop_controller(&mut self, controller: ActorId) -> Result<(), WorldError>;

    /// Advance a synchronous world by one step
    fn tick(&mut self) -> Result<u64, WorldError>;

    /// Block until a free-running world produces its next step
    fn wait_for_tick(&mut self) -> Result<u64, WorldError>;

    /// Routing service: waypoints from `start` to `goal`, empty when unreachable
    fn trace_route(&mut self, start: Location, goal: Location, resolution: f32) -> Vec<Location>;

    fn traffic_manager(&mut self, port: u16) -> &mut Self::TrafficManager;
}
