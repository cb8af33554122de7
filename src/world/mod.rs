//! World client seam and the headless simulated world behind it
//!
//! The scenario core only talks to the traits in `client`; `SimWorld` is the
//! in-process backend used by the binary and the tests.

mod blueprint;
mod catalog;
mod client;
mod command;
mod error;
mod map;
mod sim;
mod traffic;
mod types;

pub use blueprint::{wildcard_match, ActorAttribute, Blueprint, BlueprintLibrary};
pub use catalog::{stock_library, WALKER_CONTROLLER_ID};
pub use client::{TrafficManager, WorldClient};
pub use command::{destroy_all, Command, CommandResponse, FutureCommand, SpawnActor};
pub use error::WorldError;
pub use map::{MapLayout, SimMap, LANE_OFFSET, SIDEWALK_OFFSET};
pub use sim::{ActorClass, ControllerState, SimActor, SimWorld, SPAWN_CLEARANCE};
pub use traffic::{LaneBiasApi, SimTrafficManager, VehiclePolicy};
pub use types::{ActorId, Location, Rotation, Transform, VehicleControl, WorldSettings};
