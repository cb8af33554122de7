//! Immutable run configuration for the scenario orchestrator
//!
//! Every tunable lives here and is fixed before the orchestrator is built.
//! The presets reproduce the three stock scenarios.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::offset::Offset;
use super::policy::SafetyPolicy;
use super::types::{AnchorIndex, ObstacleKind};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 2000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Port the traffic manager is bound to
pub const DEFAULT_TM_PORT: u16 = 8005;

pub const DEFAULT_VEHICLE_COUNT: usize = 50;
pub const DEFAULT_WALKER_COUNT: usize = 50;

/// Walking speed used when a pedestrian template has no speed attribute
pub const DEFAULT_WALKER_SPEED: f32 = 1.4;

/// Pause after the destroy batches before reporting completion
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Where the simulation service lives
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Anchor index to local offset; keys are unique by construction
pub type PlacementMap = BTreeMap<AnchorIndex, Offset>;

/// Fixed placements of one obstacle kind
#[derive(Debug, Clone, PartialEq)]
pub struct FixedGroup {
    pub kind: ObstacleKind,
    pub placements: PlacementMap,
}

impl FixedGroup {
    pub fn new(kind: ObstacleKind, placements: &[(AnchorIndex, (f32, f32))]) -> Self {
        Self {
            kind,
            placements: placements
                .iter()
                .map(|(index, offset)| (*index, Offset::from(*offset)))
                .collect(),
        }
    }
}

/// How walkers and their controllers are created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum WalkerStrategy {
    /// One batch of walkers, then one batch of controllers
    #[default]
    Batched,
    /// One walker and controller at a time, with a bounded retry budget
    Retrying,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub connection: ConnectionConfig,
    pub traffic_manager_port: u16,
    /// Fixed obstacle groups, spawned in order
    pub fixed: Vec<FixedGroup>,
    /// Anchors random fill must avoid without placing anything there
    pub keep_clear: BTreeSet<AnchorIndex>,
    pub random_vehicles: usize,
    pub walkers: usize,
    pub walker_strategy: WalkerStrategy,
    pub policy: SafetyPolicy,
    /// Stop the step loop after this many steps; run until cancelled when `None`
    pub max_ticks: Option<u64>,
    pub settle_delay: Duration,
    pub fallback_walker_speed: f32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            traffic_manager_port: DEFAULT_TM_PORT,
            fixed: Vec::new(),
            keep_clear: BTreeSet::new(),
            random_vehicles: 0,
            walkers: 0,
            walker_strategy: WalkerStrategy::Batched,
            policy: SafetyPolicy::default(),
            max_ticks: None,
            settle_delay: SETTLE_DELAY,
            fallback_walker_speed: DEFAULT_WALKER_SPEED,
        }
    }
}

impl ScenarioConfig {
    /// Fixed obstacles at hand-picked anchors, nothing moving
    pub fn obstacles() -> Self {
        Self {
            fixed: vec![
                FixedGroup::new(ObstacleKind::Vehicle, &[(120, (0.0, 0.0)), (200, (5.0, 0.5))]),
                FixedGroup::new(
                    ObstacleKind::Cone,
                    &[(50, (0.0, 0.0)), (51, (0.0, 1.0)), (52, (0.0, -1.0))],
                ),
                FixedGroup::new(ObstacleKind::Box, &[(82, (0.0, -1.0))]),
            ],
            ..Self::default()
        }
    }

    /// Parked vehicles and cones plus random traffic and batched pedestrians
    pub fn mixed_traffic() -> Self {
        Self {
            fixed: vec![
                FixedGroup::new(ObstacleKind::Vehicle, &[(120, (0.0, 0.0)), (200, (5.0, 0.5))]),
                FixedGroup::new(
                    ObstacleKind::Cone,
                    &[(50, (0.0, 0.0)), (51, (0.0, 1.0)), (52, (0.0, -1.0))],
                ),
            ],
            random_vehicles: DEFAULT_VEHICLE_COUNT,
            walkers: DEFAULT_WALKER_COUNT,
            walker_strategy: WalkerStrategy::Batched,
            ..Self::default()
        }
    }

    /// Only moving traffic; anchor 0 stays free for the ego vehicle
    pub fn dense_traffic() -> Self {
        Self {
            keep_clear: BTreeSet::from([0]),
            random_vehicles: DEFAULT_VEHICLE_COUNT,
            walkers: DEFAULT_WALKER_COUNT,
            walker_strategy: WalkerStrategy::Retrying,
            ..Self::default()
        }
    }

    /// Every anchor index named by a fixed placement
    pub fn fixed_anchor_indices(&self) -> BTreeSet<AnchorIndex> {
        self.fixed
            .iter()
            .flat_map(|group| group.placements.keys().copied())
            .collect()
    }
}
