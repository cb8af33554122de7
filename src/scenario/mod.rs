//! Scenario population
//!
//! Everything that decides what goes into the world and takes it out again.
//! The world itself is reached only through [`crate::world::WorldClient`].

mod cancel;
mod config;
mod fixed;
pub mod offset;
mod orchestrator;
mod policy;
mod random_fill;
mod registry;
mod step;
mod teardown;
mod templates;
mod types;
mod walkers;

pub use cancel::CancelToken;
pub use config::{
    ConnectionConfig, FixedGroup, PlacementMap, ScenarioConfig, WalkerStrategy, DEFAULT_HOST,
    DEFAULT_PORT, DEFAULT_TIMEOUT, DEFAULT_TM_PORT, DEFAULT_VEHICLE_COUNT, DEFAULT_WALKER_COUNT,
    DEFAULT_WALKER_SPEED, SETTLE_DELAY,
};
pub use fixed::{spawn_fixed_group, AnchorReservations, FixedPlacementReport};
pub use offset::{apply_offset, offset_transform, Offset};
pub use orchestrator::{Orchestrator, PopulationReport, RunSummary};
pub use policy::{
    apply_policy_to_registry, apply_safety_policy, configure_traffic_manager, LaneBias,
    PolicyOutcome, PolicyReport, SafetyPolicy,
};
pub use random_fill::{select_fill_anchors, spawn_random_vehicles, RandomFillReport, VEHICLE_PATTERN};
pub use registry::EntityRegistry;
pub use step::StepMode;
pub use teardown::{teardown, TeardownReport};
pub use templates::{candidate_templates, pick_template, randomize_color};
pub use types::{
    AnchorIndex, EntityKind, ObstacleKind, SpawnedEntity, WalkerPair, AUTOPILOT_ROLE,
};
pub use walkers::{
    spawn_walkers_batched, spawn_walkers_retrying, start_walkers, PairingReport, WALKER_PATTERN,
};
