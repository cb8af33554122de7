//! Core value types shared by the world client and the scenario core
//!
//! These mirror the shapes a remote simulation service hands back: actor
//! handles, poses, settings and control records.

use std::fmt;

/// Handle of an actor living in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A world-space position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Location {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Location) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance ignoring height
    pub fn planar_distance(&self, other: &Location) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(&self, other: &Location, t: f32) -> Location {
        Location {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

/// Orientation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotation {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn from_yaw(yaw: f32) -> Self {
        Self::new(0.0, yaw, 0.0)
    }
}

/// A full pose: position plus orientation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub location: Location,
    pub rotation: Rotation,
}

impl Transform {
    pub fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// A pose at `location` with no rotation
    pub fn at(location: Location) -> Self {
        Self::new(location, Rotation::default())
    }
}

/// Time-stepping settings of the world
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldSettings {
    /// The world only advances when a client calls `tick()`
    pub synchronous_mode: bool,
    /// Fixed simulated seconds per step, `None` for variable stepping
    pub fixed_delta_seconds: Option<f32>,
}

/// Low-level driving input applied to a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleControl {
    pub throttle: f32,
    pub steer: f32,
    pub brake: f32,
    pub hand_brake: bool,
    pub reverse: bool,
}

impl VehicleControl {
    /// Control that keeps a vehicle parked
    pub fn parked() -> Self {
        Self {
            hand_brake: true,
            ..Self::default()
        }
    }
}
