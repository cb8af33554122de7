//! Types describing what a scenario run creates

use crate::world::ActorId;

/// Index into the world's anchor catalog
pub type AnchorIndex = usize;

/// Role marker set on every vehicle handed to the traffic manager
pub const AUTOPILOT_ROLE: &str = "autopilot";

/// Category of a fixed obstacle and the template pattern it is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObstacleKind {
    Vehicle,
    Cyclist,
    Cone,
    Barrier,
    Box,
    Barrel,
    TrashCan,
    Tire,
    Sign,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 9] = [
        ObstacleKind::Vehicle,
        ObstacleKind::Cyclist,
        ObstacleKind::Cone,
        ObstacleKind::Barrier,
        ObstacleKind::Box,
        ObstacleKind::Barrel,
        ObstacleKind::TrashCan,
        ObstacleKind::Tire,
        ObstacleKind::Sign,
    ];

    pub fn filter_pattern(self) -> &'static str {
        match self {
            ObstacleKind::Vehicle => "vehicle.*",
            ObstacleKind::Cyclist => "vehicle.bh.crossbike",
            ObstacleKind::Cone => "static.prop.constructioncone",
            ObstacleKind::Barrier => "static.prop.streetbarrier",
            ObstacleKind::Box => "static.prop.box*",
            ObstacleKind::Barrel => "static.prop.barrel",
            ObstacleKind::TrashCan => "static.prop.trashcan*",
            ObstacleKind::Tire => "static.prop.tire",
            ObstacleKind::Sign => "static.prop.warning*",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObstacleKind::Vehicle => "Vehicle",
            ObstacleKind::Cyclist => "Cyclist",
            ObstacleKind::Cone => "Cone",
            ObstacleKind::Barrier => "Barrier",
            ObstacleKind::Box => "Box",
            ObstacleKind::Barrel => "Barrel",
            ObstacleKind::TrashCan => "TrashCan",
            ObstacleKind::Tire => "Tire",
            ObstacleKind::Sign => "Sign",
        }
    }

    /// Vehicle-like obstacles are parked with the hand brake on
    pub fn is_vehicle_like(self) -> bool {
        matches!(self, ObstacleKind::Vehicle | ObstacleKind::Cyclist)
    }

    /// Only the generic vehicle group is narrowed to four-wheeled templates
    pub fn requires_four_wheels(self) -> bool {
        self == ObstacleKind::Vehicle
    }

    pub fn entity_kind(self) -> EntityKind {
        if self.is_vehicle_like() {
            EntityKind::FixedVehicle
        } else {
            EntityKind::FixedObstacle
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    FixedObstacle,
    FixedVehicle,
    RandomVehicle,
    Walker,
    WalkerController,
}

/// An entity this run created and owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnedEntity {
    pub id: ActorId,
    pub kind: EntityKind,
    /// Catalog anchor the entity was placed at
    pub anchor: AnchorIndex,
}

/// A walker and the AI controller driving it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkerPair {
    pub walker: ActorId,
    pub controller: ActorId,
    /// Speed handed to the controller once it starts walking
    pub speed: f32,
}
