//! Headless simulated world
//!
//! An in-process stand-in for the remote simulation service. It keeps the
//! service's observable contract: batched per-item responses, collisions on
//! crowded spawn points, step-based visibility of new actors and the split
//! between synchronous and free-running stepping.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::time::Duration;

use super::blueprint::{Blueprint, BlueprintLibrary};
use super::catalog::stock_library;
use super::client::WorldClient;
use super::command::{Command, CommandResponse, FutureCommand, SpawnActor};
use super::error::WorldError;
use super::map::{MapLayout, SimMap};
use super::traffic::{LaneBiasApi, SimTrafficManager};
use super::types::{ActorId, Location, Transform, VehicleControl, WorldSettings};

/// Minimum planar distance between two physical actors at spawn time
pub const SPAWN_CLEARANCE: f32 = 2.0;

/// Simulated seconds per step when no fixed delta is configured
const DEFAULT_STEP_SECONDS: f32 = 0.05;

/// Broad category of an actor, derived from its blueprint id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorClass {
    Vehicle,
    Walker,
    Prop,
    Controller,
}

impl ActorClass {
    pub fn of(blueprint_id: &str) -> Self {
        if blueprint_id.starts_with("vehicle.") {
            ActorClass::Vehicle
        } else if blueprint_id.starts_with("walker.") {
            ActorClass::Walker
        } else if blueprint_id.starts_with("controller.") {
            ActorClass::Controller
        } else {
            ActorClass::Prop
        }
    }

    fn is_physical(self) -> bool {
        self != ActorClass::Controller
    }
}

/// Navigation state of a walker controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    pub running: bool,
    pub destination: Option<Location>,
    pub max_speed: f32,
}

/// An actor alive in the simulated world
#[derive(Debug, Clone)]
pub struct SimActor {
    pub id: ActorId,
    pub type_id: String,
    pub class: ActorClass,
    pub transform: Transform,
    pub attributes: BTreeMap<String, String>,
    pub parent: Option<ActorId>,
    pub spawned_frame: u64,
    pub simulate_physics: bool,
    pub autopilot: bool,
    pub control: VehicleControl,
    pub controller: Option<ControllerState>,
}

pub struct SimWorld {
    map: SimMap,
    library: BlueprintLibrary,
    actors: BTreeMap<ActorId, SimActor>,
    next_id: u32,
    frame: u64,
    settings: WorldSettings,
    traffic_manager: SimTrafficManager,
    pedestrians_cross_factor: f32,
    rng: StdRng,
    frame_interval: Option<Duration>,
    pending_controller_failures: usize,
    pending_step_failures: usize,
    destroyed: Vec<ActorId>,
    destroy_calls: usize,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    fn new_internal(layout: MapLayout, rng: StdRng) -> Self {
        Self {
            map: SimMap::grid(layout),
            library: stock_library(),
            actors: BTreeMap::new(),
            next_id: 1,
            frame: 0,
            settings: WorldSettings::default(),
            traffic_manager: SimTrafficManager::new(8000),
            pedestrians_cross_factor: 1.0,
            rng,
            frame_interval: None,
            pending_controller_failures: 0,
            pending_step_failures: 0,
            destroyed: Vec::new(),
            destroy_calls: 0,
        }
    }

    pub fn new() -> Self {
        Self::new_internal(MapLayout::default(), StdRng::from_rng(&mut rand::rng()))
    }

    /// Create a world with a seeded RNG for reproducible runs
    pub fn new_with_seed(seed: u64) -> Self {
        Self::new_internal(MapLayout::default(), StdRng::seed_from_u64(seed))
    }

    /// Create a seeded world on a custom map
    pub fn with_layout(layout: MapLayout, seed: u64) -> Self {
        Self::new_internal(layout, StdRng::seed_from_u64(seed))
    }

    /// Open a session with the headless world behind `host:port`
    pub fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
        seed: Option<u64>,
    ) -> Result<Self, WorldError> {
        let refuse = |reason: &str| WorldError::Connection {
            host: host.to_string(),
            port,
            reason: reason.to_string(),
        };

        if host.trim().is_empty() {
            return Err(refuse("host is empty"));
        }
        if port == 0 {
            return Err(refuse("port 0 is not a valid endpoint"));
        }
        if timeout.is_zero() {
            return Err(refuse("timeout must be positive"));
        }

        let world = match seed {
            Some(seed) => Self::new_with_seed(seed),
            None => Self::new(),
        };
        info!(
            "Connected to simulated world at {}:{} ({} anchors, {} intersections, {} roads)",
            host,
            port,
            world.map.anchors().len(),
            world.map.intersection_count(),
            world.map.road_count()
        );
        Ok(world)
    }

    /// Start with the given stepping settings, as if another client set them
    pub fn with_settings(mut self, settings: WorldSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Pace free-running steps in real time
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    /// Reject the next `count` controller spawns
    pub fn fail_next_controller_spawns(&mut self, count: usize) {
        self.pending_controller_failures = count;
    }

    /// Make the next `count` ticks or tick waits time out
    pub fn fail_next_steps(&mut self, count: usize) {
        self.pending_step_failures = count;
    }

    pub fn set_lane_bias_api(&mut self, api: LaneBiasApi) {
        self.traffic_manager.lane_bias_api = api;
    }

    pub fn sim_traffic_manager(&self) -> &SimTrafficManager {
        &self.traffic_manager
    }

    pub fn sim_traffic_manager_mut(&mut self) -> &mut SimTrafficManager {
        &mut self.traffic_manager
    }

    pub fn map(&self) -> &SimMap {
        &self.map
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn actor(&self, id: ActorId) -> Option<&SimActor> {
        self.actors.get(&id)
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn actors_of(&self, class: ActorClass) -> Vec<&SimActor> {
        self.actors.values().filter(|a| a.class == class).collect()
    }

    /// Every id destroyed so far, in destruction order
    pub fn destroyed_ids(&self) -> &[ActorId] {
        &self.destroyed
    }

    /// Number of single-actor destroy calls received
    pub fn destroy_calls(&self) -> usize {
        self.destroy_calls
    }

    pub fn pedestrians_cross_factor(&self) -> f32 {
        self.pedestrians_cross_factor
    }

    fn next_actor_id(&mut self) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        id
    }

    fn is_visible(&self, actor: &SimActor) -> bool {
        actor.spawned_frame < self.frame
    }

    fn spawn(
        &mut self,
        blueprint: &Blueprint,
        transform: &Transform,
        parent: Option<ActorId>,
    ) -> Result<ActorId, WorldError> {
        let class = ActorClass::of(&blueprint.id);
        let mut location = transform.location;

        if class == ActorClass::Controller {
            let parent_id = parent.ok_or(WorldError::InvalidParent(ActorId(0)))?;
            let parent_actor = self
                .actors
                .get(&parent_id)
                .ok_or(WorldError::InvalidParent(parent_id))?;
            if parent_actor.class != ActorClass::Walker {
                return Err(WorldError::InvalidParent(parent_id));
            }
            if self.pending_controller_failures > 0 {
                self.pending_controller_failures -= 1;
                return Err(WorldError::Backend(format!(
                    "controller for walker {parent_id} could not be created"
                )));
            }
            location = parent_actor.transform.location;
        } else if let Some(parent_id) = parent {
            let parent_actor = self
                .actors
                .get(&parent_id)
                .ok_or(WorldError::InvalidParent(parent_id))?;
            location = parent_actor.transform.location;
        }

        if class.is_physical() {
            let blocked = self.actors.values().any(|other| {
                other.class.is_physical()
                    && other.transform.location.planar_distance(&location) < SPAWN_CLEARANCE
            });
            if blocked {
                return Err(WorldError::Collision {
                    x: location.x,
                    y: location.y,
                });
            }
        }

        let id = self.next_actor_id();
        let actor = SimActor {
            id,
            type_id: blueprint.id.clone(),
            class,
            transform: Transform::new(location, transform.rotation),
            attributes: blueprint.attribute_values(),
            parent,
            spawned_frame: self.frame,
            simulate_physics: matches!(class, ActorClass::Vehicle | ActorClass::Walker),
            autopilot: false,
            control: VehicleControl::default(),
            controller: (class == ActorClass::Controller).then(ControllerState::default),
        };
        self.actors.insert(id, actor);
        Ok(id)
    }

    fn destroy(&mut self, id: ActorId) -> Result<ActorId, WorldError> {
        let actor = self.actors.remove(&id).ok_or(WorldError::ActorNotFound(id))?;
        if actor.class == ActorClass::Vehicle {
            self.traffic_manager.unregister(id);
        }
        self.destroyed.push(id);
        Ok(id)
    }

    fn apply_future(&mut self, id: ActorId, command: FutureCommand) -> Result<(), WorldError> {
        match command {
            FutureCommand::SetAutopilot { enabled, tm_port } => {
                self.set_autopilot(id, enabled, tm_port)
            }
        }
    }

    fn execute(&mut self, command: Command) -> CommandResponse {
        match command {
            Command::Spawn(SpawnActor {
                blueprint,
                transform,
                parent,
                then,
            }) => {
                let id = self.spawn(&blueprint, &transform, parent)?;
                for follow_up in then {
                    if let Err(e) = self.apply_future(id, follow_up) {
                        let _ = self.destroy(id);
                        return Err(e);
                    }
                }
                Ok(id)
            }
            Command::Destroy(id) => self.destroy(id),
        }
    }

    fn actor_mut(&mut self, id: ActorId) -> Result<&mut SimActor, WorldError> {
        self.actors.get_mut(&id).ok_or(WorldError::ActorNotFound(id))
    }

    fn controller_mut(
        &mut self,
        id: ActorId,
        require_visible: bool,
    ) -> Result<&mut ControllerState, WorldError> {
        let actor = self.actors.get(&id).ok_or(WorldError::ActorNotFound(id))?;
        if require_visible && !self.is_visible(actor) {
            return Err(WorldError::NotYetVisible(id));
        }
        self.actor_mut(id)?
            .controller
            .as_mut()
            .ok_or(WorldError::WrongActorType(id))
    }

    fn take_step_failure(&mut self) -> bool {
        if self.pending_step_failures == 0 {
            return false;
        }
        self.pending_step_failures -= 1;
        true
    }

    fn advance(&mut self) -> u64 {
        self.frame += 1;
        let dt = self
            .settings
            .fixed_delta_seconds
            .unwrap_or(DEFAULT_STEP_SECONDS);

        // Walkers move toward their controller's destination
        let moves: Vec<(ActorId, Location, f32)> = self
            .actors
            .values()
            .filter_map(|actor| {
                let state = actor.controller.as_ref()?;
                let destination = state.destination?;
                (state.running && state.max_speed > 0.0)
                    .then(|| (actor.parent, destination, state.max_speed))
            })
            .filter_map(|(parent, destination, speed)| Some((parent?, destination, speed)))
            .collect();

        for (walker, destination, speed) in moves {
            if let Some(actor) = self.actors.get_mut(&walker) {
                let current = actor.transform.location;
                let remaining = current.distance(&destination);
                let step = speed * dt;
                actor.transform.location = if remaining <= step {
                    destination
                } else {
                    current.lerp(&destination, step / remaining)
                };
            }
        }

        self.frame
    }
}

impl WorldClient for SimWorld {
    type TrafficManager = SimTrafficManager;

    fn settings(&self) -> WorldSettings {
        self.settings
    }

    fn apply_settings(&mut self, settings: WorldSettings) -> Result<u64, WorldError> {
        debug!("Applying world settings {:?}", settings);
        self.settings = settings;
        Ok(self.frame)
    }

    fn spawn_points(&self) -> Vec<Transform> {
        self.map.anchors().to_vec()
    }

    fn blueprint_library(&self) -> BlueprintLibrary {
        self.library.clone()
    }

    fn try_spawn_actor(
        &mut self,
        blueprint: &Blueprint,
        transform: &Transform,
        parent: Option<ActorId>,
    ) -> Option<ActorId> {
        match self.spawn(blueprint, transform, parent) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!("Spawn of {} refused: {}", blueprint.id, e);
                None
            }
        }
    }

    fn apply_batch_sync(
        &mut self,
        commands: Vec<Command>,
        do_tick: bool,
    ) -> Vec<CommandResponse> {
        let responses = commands
            .into_iter()
            .map(|command| self.execute(command))
            .collect();

        if do_tick && self.settings.synchronous_mode {
            self.advance();
        }

        responses
    }

    fn apply_batch(&mut self, commands: Vec<Command>) {
        for command in commands {
            if let Err(e) = self.execute(command) {
                debug!("Batch command ignored: {}", e);
            }
        }
    }

    fn destroy_actor(&mut self, actor: ActorId) -> bool {
        self.destroy_calls += 1;
        self.destroy(actor).is_ok()
    }

    fn actor_attribute(&self, actor: ActorId, key: &str) -> Option<String> {
        self.actors.get(&actor)?.attributes.get(key).cloned()
    }

    fn set_simulate_physics(&mut self, actor: ActorId, enabled: bool) -> Result<(), WorldError> {
        let actor = self.actor_mut(actor)?;
        if actor.class == ActorClass::Controller {
            return Err(WorldError::WrongActorType(actor.id));
        }
        actor.simulate_physics = enabled;
        Ok(())
    }

    fn set_autopilot(
        &mut self,
        actor: ActorId,
        enabled: bool,
        tm_port: u16,
    ) -> Result<(), WorldError> {
        let vehicle = self.actor_mut(actor)?;
        if vehicle.class != ActorClass::Vehicle {
            return Err(WorldError::WrongActorType(actor));
        }
        vehicle.autopilot = enabled;

        self.traffic_manager.bind(tm_port);
        if enabled {
            self.traffic_manager.register(actor);
        } else {
            self.traffic_manager.unregister(actor);
        }
        Ok(())
    }

    fn apply_control(&mut self, actor: ActorId, control: VehicleControl) -> Result<(), WorldError> {
        let vehicle = self.actor_mut(actor)?;
        if vehicle.class != ActorClass::Vehicle {
            return Err(WorldError::WrongActorType(actor));
        }
        vehicle.control = control;
        Ok(())
    }

    fn random_navigation_location(&mut self) -> Option<Location> {
        self.map.random_sidewalk_location(&mut self.rng)
    }

    fn set_pedestrians_cross_factor(&mut self, percentage: f32) {
        self.pedestrians_cross_factor = percentage;
    }

    fn start_controller(&mut self, controller: ActorId) -> Result<(), WorldError> {
        self.controller_mut(controller, true)?.running = true;
        Ok(())
    }

    fn go_to_location(
        &mut self,
        controller: ActorId,
        destination: Location,
    ) -> Result<(), WorldError> {
        self.controller_mut(controller, true)?.destination = Some(destination);
        Ok(())
    }

    fn set_max_speed(&mut self, controller: ActorId, speed: f32) -> Result<(), WorldError> {
        self.controller_mut(controller, true)?.max_speed = speed;
        Ok(())
    }

    fn stop_controller(&mut self, controller: ActorId) -> Result<(), WorldError> {
        let state = self.controller_mut(controller, false)?;
        state.running = false;
        state.destination = None;
        Ok(())
    }

    fn tick(&mut self) -> Result<u64, WorldError> {
        if !self.settings.synchronous_mode {
            return Err(WorldError::NotSynchronous);
        }
        if self.take_step_failure() {
            return Err(WorldError::TickTimeout);
        }
        Ok(self.advance())
    }

    fn wait_for_tick(&mut self) -> Result<u64, WorldError> {
        if self.settings.synchronous_mode {
            // Nobody else drives a synchronous world in-process
            return Err(WorldError::TickTimeout);
        }
        if self.take_step_failure() {
            return Err(WorldError::TickTimeout);
        }
        if let Some(interval) = self.frame_interval {
            std::thread::sleep(interval);
        }
        Ok(self.advance())
    }

    fn trace_route(&mut self, start: Location, goal: Location, resolution: f32) -> Vec<Location> {
        self.map.trace_route(start, goal, resolution)
    }

    fn traffic_manager(&mut self, port: u16) -> &mut SimTrafficManager {
        self.traffic_manager.bind(port);
        &mut self.traffic_manager
    }
}
